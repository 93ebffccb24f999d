//! A CGI program that never finishes, for probing how a server enforces its
//! execution time limit.

use {
    anyhow::{Context, Result},
    cgi_sdk::{write_header, ContentType, ProbeConfig},
    std::{
        convert::Infallible,
        io::Write,
        thread,
        time::Duration,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub tick: Duration,
    /// A progress marker is written every `report_every` ticks.
    pub report_every: u64,
}

impl From<&ProbeConfig> for LoopSettings {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            tick: config.loop_tick,
            report_every: config.loop_report_every,
        }
    }
}

/// Writes the preamble, then loops forever emitting a flushed marker every
/// `report_every` ticks. The only way out is a failed write.
pub fn handle(mut stdout: impl Write, settings: &LoopSettings) -> Result<Infallible> {
    write_header(&mut stdout, ContentType::HTML)?;
    writeln!(stdout, "<html><head><title>Infinite Loop Test</title></head><body>")?;
    writeln!(stdout, "<h1>Starting Infinite Loop Test...</h1>")?;
    writeln!(
        stdout,
        "<p>This script will run indefinitely to test server timeout handling.</p>"
    )?;
    stdout.flush()?;

    let report_every = settings.report_every.max(1);
    let mut counter = 0_u64;
    loop {
        counter += 1;
        thread::sleep(settings.tick);

        if counter % report_every == 0 {
            tracing::debug!(counter, "loop iteration");
            writeln!(stdout, "<p>Loop iteration: {counter}</p>")
                .and_then(|()| stdout.flush())
                .with_context(|| format!("output closed after {counter} iterations"))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::io::{self, ErrorKind},
    };

    /// Accepts `capacity` bytes and then fails like a closed pipe.
    struct ClosingPipe {
        written: Vec<u8>,
        capacity: usize,
        flushes: usize,
    }

    impl ClosingPipe {
        fn new(capacity: usize) -> Self {
            Self {
                written: Vec::new(),
                capacity,
                flushes: 0,
            }
        }
    }

    impl Write for ClosingPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.capacity {
                return Err(io::Error::from(ErrorKind::BrokenPipe));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    const PREAMBLE: &str = "Content-Type: text/html\n\n\
        <html><head><title>Infinite Loop Test</title></head><body>\n\
        <h1>Starting Infinite Loop Test...</h1>\n\
        <p>This script will run indefinitely to test server timeout handling.</p>\n";

    fn settings(report_every: u64) -> LoopSettings {
        LoopSettings {
            tick: Duration::ZERO,
            report_every,
        }
    }

    #[test]
    fn emits_markers_until_output_closes() {
        let markers = "<p>Loop iteration: 3</p>\n<p>Loop iteration: 6</p>\n";
        let mut pipe = ClosingPipe::new(PREAMBLE.len() + markers.len());

        let error = handle(&mut pipe, &settings(3)).unwrap_err();

        assert_eq!(format!("{PREAMBLE}{markers}"), String::from_utf8_lossy(&pipe.written));
        assert_eq!(3, pipe.flushes);
        assert_eq!(
            Some(ErrorKind::BrokenPipe),
            error.downcast_ref::<io::Error>().map(io::Error::kind)
        );
        assert!(error.to_string().contains("after 9 iterations"));
    }

    #[test]
    fn preamble_is_flushed_before_looping() {
        let mut pipe = ClosingPipe::new(PREAMBLE.len());

        handle(&mut pipe, &settings(1)).unwrap_err();

        assert_eq!(PREAMBLE, String::from_utf8_lossy(&pipe.written));
        assert_eq!(1, pipe.flushes);
    }

    #[test]
    fn zero_interval_marks_every_tick() {
        let markers = "<p>Loop iteration: 1</p>\n<p>Loop iteration: 2</p>\n";
        let mut pipe = ClosingPipe::new(PREAMBLE.len() + markers.len());

        handle(&mut pipe, &settings(0)).unwrap_err();

        assert_eq!(format!("{PREAMBLE}{markers}"), String::from_utf8_lossy(&pipe.written));
    }

    #[test]
    fn settings_follow_config() {
        let config = ProbeConfig {
            loop_tick: Duration::from_millis(5),
            loop_report_every: 7,
            ..ProbeConfig::default()
        };
        assert_eq!(
            LoopSettings {
                tick: Duration::from_millis(5),
                report_every: 7,
            },
            LoopSettings::from(&config)
        );
    }
}
