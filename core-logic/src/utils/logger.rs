use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, FormattedFields},
    prelude::*,
    registry::LookupSpan,
    EnvFilter, Layer,
};

/// Installs the global subscriber: colored console output plus an hourly
/// rolling plain-text file under `logs/`.
///
/// The console honours `RUST_LOG` and defaults to `info`. The returned guard
/// must be kept alive for the file writer to flush.
pub fn setup_logger() -> Option<WorkerGuard> {
    std::fs::create_dir_all("logs").ok();

    let file_appender = tracing_appender::rolling::hourly("logs", "app");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = tracing_subscriber::filter::Targets::new().with_default(Level::INFO);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(console_filter);

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();

    match installed {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn event_message(event: &Event<'_>) -> String {
    let mut visitor = MessageVisitor {
        message: String::new(),
    };
    event.record(&mut visitor);
    visitor.message
}

/// Collects `name{fields}` for every span in the event's scope, outermost
/// first, e.g. `[account=003]`.
fn span_context<S, N>(ctx: &FmtContext<'_, S, N>) -> String
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let mut parts = Vec::new();
    if let Some(scope) = ctx.event_scope() {
        for span in scope.from_root() {
            let ext = span.extensions();
            match ext.get::<FormattedFields<N>>() {
                Some(fields) if !fields.is_empty() => parts.push(fields.to_string()),
                _ => parts.push(span.name().to_string()),
            }
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}] ", parts.join(" "))
    }
}

pub fn level_style(level: &Level) -> Style {
    match *level {
        Level::ERROR => Style::new().fg(Color::LightRed).bold(),
        Level::WARN => Style::new().fg(Color::Yellow),
        Level::INFO => Style::new().fg(Color::LightGreen),
        Level::DEBUG => Style::new().fg(Color::LightBlue),
        Level::TRACE => Style::new().fg(Color::Purple),
    }
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = event.metadata().level();
        let style = level_style(level);
        let timestamp = Local::now().format("%H:%M:%S");
        let context = span_context(ctx);
        let msg = event_message(event);

        write!(
            writer,
            "{} {} {}{}",
            Style::new().dimmed().paint(timestamp.to_string()),
            style.paint(format!("{:>5}", level.as_str())),
            Style::new().fg(Color::Cyan).paint(context),
            style.paint(msg)
        )?;
        writeln!(writer)
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level();

        write!(writer, "{} [{}] {}", timestamp, level, span_context(ctx))?;
        writeln!(writer, "{}", event_message(event))
    }
}
