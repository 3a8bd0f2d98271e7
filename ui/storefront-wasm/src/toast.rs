use gloo_timers::callback::Timeout;
use sf_session::{Notice, NoticeLevel};
use std::cell::Cell;

use crate::dom::{self, Elements};

const VISIBLE_MS: u32 = 3_000;

thread_local! {
    static GENERATION: Cell<u32> = const { Cell::new(0) };
}

fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Success => "toast-success",
        NoticeLevel::Info => "toast-info",
        NoticeLevel::Error => "toast-error",
    }
}

/// Show a notice; a newer notice replaces it and restarts the timer.
pub fn show(els: &Elements, notice: &Notice) {
    let generation = GENERATION.with(|g| {
        g.set(g.get().wrapping_add(1));
        g.get()
    });

    dom::set_text(&els.toast, &notice.message);
    for level in [NoticeLevel::Success, NoticeLevel::Info, NoticeLevel::Error] {
        dom::toggle_class(&els.toast, level_class(level), level == notice.level);
    }
    dom::toggle_class(&els.toast, "visible", true);

    match notice.level {
        NoticeLevel::Error => gloo_console::warn!(notice.message.clone()),
        _ => gloo_console::log!(notice.message.clone()),
    }

    let toast = els.toast.clone();
    Timeout::new(VISIBLE_MS, move || {
        if GENERATION.with(|g| g.get()) == generation {
            dom::toggle_class(&toast, "visible", false);
        }
    })
    .forget();
}
