/// Level of the per-tick grant statistics.
pub const STATICS_LEVEL: tracing::Level = tracing::Level::INFO;
/// Level of configuration and reset statistics.
pub const STATICS_CFG_LEVEL: tracing::Level = tracing::Level::DEBUG;

#[cfg(not(test))]
mod layers {
    use tracing::Subscriber;
    use tracing_chrome::{ChromeLayer, ChromeLayerBuilder};
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, filter, fmt, registry};

    /// Chrome trace layer writing `<file>.trace.json`.
    pub fn statics<S>(file: &str) -> (ChromeLayer<S>, tracing_chrome::FlushGuard)
    where
        S: Subscriber + for<'span> registry::LookupSpan<'span> + Send + Sync,
    {
        ChromeLayerBuilder::new()
            .include_args(true)
            .file(format!("{}.trace.json", file))
            .include_locations(false)
            .build()
    }

    /// Keeps only the statistics events of `targets` at the levels selected
    /// by `statics_lvl`: bit 1 tick statistics, bit 0 config statistics.
    pub fn statics_filter(
        statics_lvl: u32,
        targets: &'static [&'static str],
    ) -> filter::FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool> {
        filter::filter_fn(move |metadata| {
            (metadata.level() == &super::STATICS_LEVEL && (statics_lvl & 0x2 != 0)
                || metadata.level() == &super::STATICS_CFG_LEVEL && (statics_lvl & 0x1 != 0))
                && targets.contains(&metadata.target())
        })
    }

    /// Pretty stdout layer on a non-blocking writer, filtered by `RUST_LOG`.
    pub fn default<S>() -> filter::Filtered<
        fmt::Layer<
            S,
            fmt::format::Pretty,
            fmt::format::Format<fmt::format::Pretty>,
            tracing_appender::non_blocking::NonBlocking,
        >,
        EnvFilter,
        S,
    >
    where
        S: Subscriber + for<'span> registry::LookupSpan<'span> + Send + Sync,
    {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        std::mem::forget(guard);
        let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(""));
        fmt::layer()
            .pretty()
            .with_writer(non_blocking)
            .with_filter(filter_layer)
    }
}
#[cfg(not(test))]
pub use layers::*;
