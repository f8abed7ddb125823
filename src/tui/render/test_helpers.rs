use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::kv::MemoryStore;
use crate::model::UiConfig;
use crate::parse::parse_checklist;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Build an App over in-memory storage from checklist markdown.
pub fn app_with_checklist(md: &str) -> App {
    let (checklist, _warnings) = parse_checklist(md);
    App::new(
        checklist,
        Box::new(MemoryStore::new()),
        UiConfig::default(),
        None,
    )
}

/// Two phases, five tasks.
pub const SIMPLE_CHECKLIST_MD: &str = "\
# Launch

## Foundation {#p1}

- [ ] `p1-a` Register domain
- [ ] `p1-b` Create repo

## Build {#p2}

- [ ] `p2-a` Write code
- [ ] `p2-b` Write tests
- [ ] `p2-c` Ship it
";
