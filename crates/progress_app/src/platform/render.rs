use chrono::{DateTime, Utc};
use progress_core::{ProgressState, SummaryView};

/// Formats the indicator for the terminal. Rows are listed only while the
/// menu is open.
pub(crate) fn render(view: &SummaryView, updated: DateTime<Utc>) -> Vec<String> {
    let spinner = if view.spinning { "[*]" } else { "[ ]" };
    let noun = if view.counter == 1 { "job" } else { "jobs" };
    let mut lines = vec![format!(
        "{spinner} {} {noun} in progress (updated {})",
        view.counter,
        updated.format("%H:%M:%S")
    )];

    if !view.open {
        return lines;
    }
    if view.rows.is_empty() {
        lines.push("    no background jobs".to_string());
        return lines;
    }

    for row in &view.rows {
        let progress = match row.progress {
            Some(percent) => format!("{percent:>5.1}%"),
            None => "     -".to_string(),
        };
        let cancel = if view.cancel_targets.contains(&row.code) {
            "  [cancel]"
        } else {
            ""
        };
        lines.push(format!(
            "    {:<32} {:<10} {progress}{cancel}",
            truncate(&row.label, 32),
            state_label(&row.state)
        ));
    }
    lines
}

fn state_label(state: &ProgressState) -> &str {
    match state {
        ProgressState::Ongoing => "running",
        ProgressState::Done => "done",
        ProgressState::Other(raw) => raw,
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use progress_core::{Presenter, ProgressItem, ProgressSnapshot};

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn closed_menu_shows_only_the_counter() {
        let view = SummaryView {
            counter: 1,
            spinning: true,
            ..SummaryView::default()
        };
        assert_eq!(render(&view, at()), vec!["[*] 1 job in progress (updated 09:30:00)"]);
    }

    #[test]
    fn open_menu_lists_rows_with_cancel_marker() {
        let mut presenter = Presenter::new();
        presenter.set_open(true);
        let view = presenter.render(&ProgressSnapshot::new(vec![
            ProgressItem::new("j1", ProgressState::Ongoing)
                .cancellable(true)
                .with_name("Import partners")
                .with_progress(40.0),
            ProgressItem::new("j2", ProgressState::Other("cancel".into())),
        ]));

        let lines = render(&view, at());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[*] 2 jobs"));
        assert!(lines[1].contains("Import partners"));
        assert!(lines[1].contains(" 40.0%"));
        assert!(lines[1].ends_with("[cancel]"));
        assert!(lines[2].contains("cancel"));
        assert!(!lines[2].ends_with("[cancel]"));
    }

    #[test]
    fn open_empty_menu_says_so() {
        let view = SummaryView {
            open: true,
            ..SummaryView::default()
        };
        assert_eq!(
            render(&view, at()),
            vec![
                "[ ] 0 jobs in progress (updated 09:30:00)".to_string(),
                "    no background jobs".to_string()
            ]
        );
    }

    #[test]
    fn long_labels_are_truncated() {
        assert_eq!(truncate("abcdefgh", 6), "abc...");
        assert_eq!(truncate("abc", 6), "abc");
    }
}
