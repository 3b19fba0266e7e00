use super::drr;
use super::logger;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;
static LOGGER: Mutex<Option<Option<tracing_chrome::FlushGuard>>> = Mutex::new(None);

#[unsafe(no_mangle)]
unsafe extern "C" fn drr_logger_en(statics_lvl: u32) {
    let mut logger_guard = LOGGER.lock().unwrap();
    if logger_guard.is_some() {
        return;
    }
    let logger = tracing_subscriber::registry().with(logger::default());
    if statics_lvl & 0x3 != 0 {
        let filter = logger::statics_filter(statics_lvl, &[drr::STATICS_TAR]);
        let (statics, guard) = logger::statics("model");
        logger.with(statics.with_filter(filter)).init();
        *logger_guard = Some(Some(guard));
    } else {
        logger.init();
        *logger_guard = Some(None)
    }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn drr_logger_dis() {
    LOGGER.lock().unwrap().take();
}
