//! Desktop notifications for engine notices.

use presencelight_lib::notice::{LogNotifier, Notice, Notifier};

/// Logs every notice and also shows it as a desktop notification.
///
/// Notices are raised on the engine worker, so the notification itself is
/// shown from a short-lived thread.
#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier {
    show: fn(&str, &str),
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        DesktopNotifier { show: show_desktop }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: &Notice) {
        LogNotifier.notify(notice);

        let show = self.show;
        let summary = notice.title().to_string();
        let body = notice.to_string();
        if let Err(e) = std::thread::Builder::new()
            .name("notify".into())
            .spawn(move || show(&summary, &body))
        {
            log::debug!("[notice] could not spawn notification thread: {e}");
        }
    }
}

fn show_desktop(summary: &str, body: &str) {
    let mut n = notify_rust::Notification::new();
    n.summary(summary);
    n.body(body);
    if let Err(e) = n.show() {
        log::debug!("[notice] desktop notification failed: {e}");
    }
}

/// Notifier for the current settings.
pub fn notifier(desktop: bool) -> Box<dyn Notifier> {
    if desktop {
        Box::new(DesktopNotifier::default())
    } else {
        Box::new(LogNotifier)
    }
}
