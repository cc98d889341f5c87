use crate::engine::AlarmRecord;

/// Builds the notification text for `alarms` raised on `host`.
///
/// Returns `None` when there is nothing to report. The text uses the small
/// HTML subset understood by Telegram's HTML parse mode.
///
/// # Examples
///
/// ```
/// use pimon_alert::summary::render;
///
/// assert!(render("pi", &[]).is_none());
/// ```
pub fn render(host: &str, alarms: &[AlarmRecord]) -> Option<String> {
    if alarms.is_empty() {
        return None;
    }

    let mut message = format!("⚠️ ALARM: <code>{}</code>\n", escape_html(host));
    message.push_str("<i>Threshold limits breached</i>\n\n");
    message.push_str("Details:\n------------------\n");

    for (i, alarm) in alarms.iter().enumerate() {
        let kind = if alarm.is_process_alarm {
            "Process"
        } else {
            "Host"
        };
        message.push_str(&format!(
            "{}) <code>Name: {}\nType: {}\nDesc: {}\nThreshold: {}\nCurrent: {}\n</code>\n -- \n",
            i + 1,
            escape_html(&alarm.metric_display_name),
            kind,
            escape_html(&alarm.threshold_description),
            alarm.threshold_value,
            alarm.observed_value,
        ));
    }

    message.push_str("Please look at the affected host(s)");
    Some(message)
}

/// Escapes the characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
