use std::{fmt, path::PathBuf, time::Duration};

use chrono::Utc;
use nmea::{sentences::FixType, ParseResult};
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    net::TcpStream,
};
use trip_broadcaster_lib::{
    coordinate::{Coordinate, Position},
    location::{LocationCallback, LocationError, LocationEvent, LocationProvider, WatchId, WatchOptions},
};

use super::WatchRegistry;

// Rough user equivalent range error, used to turn HDOP into meters.
const UERE_M: f64 = 5.0;

type SentenceLines = Lines<Box<dyn AsyncBufRead + Send + Unpin>>;

#[derive(Debug, Clone)]
pub enum NmeaSource {
    /// A recorded log, played back with a fixed delay between fixes.
    Replay { path: PathBuf, interval: Duration },
    /// A live receiver exposed over TCP.
    Tcp(String),
}

impl fmt::Display for NmeaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NmeaSource::Replay { path, .. } => write!(f, "file {}", path.display()),
            NmeaSource::Tcp(addr) => write!(f, "tcp {}", addr),
        }
    }
}

/// Reads GGA sentences from an NMEA 0183 stream. Each watch opens its own
/// connection to the source.
pub struct NmeaProvider {
    source: NmeaSource,
    watches: WatchRegistry,
}

impl NmeaProvider {
    pub fn replay(path: PathBuf, interval: Duration) -> Self {
        Self::new(NmeaSource::Replay { path, interval })
    }

    pub fn tcp(addr: String) -> Self {
        Self::new(NmeaSource::Tcp(addr))
    }

    fn new(source: NmeaSource) -> Self {
        Self {
            source,
            watches: WatchRegistry::new(),
        }
    }
}

impl LocationProvider for NmeaProvider {
    fn is_supported(&self) -> bool {
        true
    }

    fn watch_position(&self, options: WatchOptions, callback: LocationCallback) -> WatchId {
        let id = self.watches.spawn(watch(self.source.clone(), options, callback));
        tracing::info!("Watching NMEA {} as {}", self.source, id);
        id
    }

    fn clear_watch(&self, id: WatchId) {
        self.watches.clear(id);
    }
}

async fn open(source: &NmeaSource) -> std::io::Result<SentenceLines> {
    let reader: Box<dyn AsyncBufRead + Send + Unpin> = match source {
        NmeaSource::Replay { path, .. } => Box::new(BufReader::new(File::open(path).await?)),
        NmeaSource::Tcp(addr) => Box::new(BufReader::new(TcpStream::connect(addr).await?)),
    };
    Ok(reader.lines())
}

async fn watch(source: NmeaSource, options: WatchOptions, callback: LocationCallback) {
    let mut lines = match open(&source).await {
        Ok(lines) => lines,
        Err(err) => {
            tracing::error!("Failed to open NMEA {}: {}", source, err);
            callback(LocationEvent::Error(LocationError::PositionUnavailable));
            return;
        },
    };

    loop {
        match tokio::time::timeout(options.timeout, next_fix(&mut lines, options.high_accuracy)).await {
            Ok(Ok(Some(position))) => {
                callback(LocationEvent::Position(position));
                if let NmeaSource::Replay { interval, .. } = &source {
                    tokio::time::sleep(*interval).await;
                }
            },
            Ok(Ok(None)) => {
                tracing::info!("NMEA {} ended", source);
                callback(LocationEvent::Error(LocationError::PositionUnavailable));
                return;
            },
            Ok(Err(err)) => {
                tracing::error!("Failed to read NMEA {}: {}", source, err);
                callback(LocationEvent::Error(LocationError::PositionUnavailable));
                return;
            },
            Err(_) => {
                tracing::debug!("No fix within {:?}", options.timeout);
                callback(LocationEvent::Error(LocationError::Timeout));
            },
        }
    }
}

async fn next_fix(lines: &mut SentenceLines, high_accuracy: bool) -> std::io::Result<Option<Position>> {
    while let Some(line) = lines.next_line().await? {
        if let Some(position) = parse_fix(&line, high_accuracy) {
            return Ok(Some(position));
        }
    }
    Ok(None)
}

/// Turns a GGA sentence into a position. Anything else, and fixes not good
/// enough for the requested accuracy, yield `None`.
pub fn parse_fix(sentence: &str, high_accuracy: bool) -> Option<Position> {
    let sentence = sentence.trim().trim_matches('\0');
    if !sentence.starts_with('$') {
        return None;
    }

    let gga = match nmea::parse_str(sentence) {
        Ok(ParseResult::GGA(gga)) => gga,
        Ok(_) => return None,
        Err(err) => {
            tracing::debug!("Failed to parse sentence {:?}: {}", sentence, err);
            return None;
        },
    };

    let accepted = match gga.fix_type? {
        FixType::Invalid => false,
        FixType::Gps | FixType::DGps | FixType::Pps | FixType::Rtk | FixType::FloatRtk => true,
        // Estimated, manual and simulated fixes
        _ => !high_accuracy,
    };
    if !accepted {
        return None;
    }

    let coordinate = Coordinate::new(gga.latitude?, gga.longitude?);
    let accuracy_m = gga.hdop.map(|hdop| hdop as f64 * UERE_M);

    Some(Position::new(coordinate, accuracy_m, Utc::now()))
}

#[cfg(test)]
mod tests {
    use tokio::{io::AsyncWriteExt, net::TcpListener, sync::mpsc};

    use super::*;

    const FIX_MUNICH: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const NO_FIX: &str = "$GPGGA,123520,4807.038,N,01131.000,E,0,00,,,M,,M,,*58";
    const ESTIMATED: &str = "$GPGGA,123521,4807.040,N,01131.002,E,6,04,2.5,545.4,M,46.9,M,,*44";
    const FIX_COPENHAGEN: &str = "$GNGGA,101500.00,5540.5000,N,01234.1000,E,1,12,0.8,12.0,M,41.5,M,,*4B";

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "{actual} != {expected}");
    }

    fn channel_callback() -> (LocationCallback, mpsc::UnboundedReceiver<LocationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback: LocationCallback = Box::new(move |event| {
            let _ = tx.send(event);
        });
        (callback, rx)
    }

    #[test]
    fn parses_gga() {
        let position = parse_fix(FIX_MUNICH, true).unwrap();
        assert_close(position.coordinate.lat, 48.1173);
        assert_close(position.coordinate.lng, 11.0 + 31.0 / 60.0);
        assert_close(position.accuracy_m.unwrap(), 0.9 * UERE_M);

        let position = parse_fix("$GPGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*76", true).unwrap();
        assert!(position.coordinate.lng < 0.0);
    }

    #[test]
    fn rejects_missing_fix() {
        assert!(parse_fix(NO_FIX, false).is_none());
        assert!(parse_fix("garbage", false).is_none());
        assert!(parse_fix("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*00", false).is_none());
    }

    #[test]
    fn estimated_fix_needs_low_accuracy() {
        assert!(parse_fix(ESTIMATED, true).is_none());
        assert!(parse_fix(ESTIMATED, false).is_some());
    }

    #[tokio::test]
    async fn replays_file_then_reports_end() {
        let path = std::env::temp_dir().join(format!("driver_console_replay_{}.nmea", std::process::id()));
        std::fs::write(&path, format!("{FIX_MUNICH}\r\n{NO_FIX}\r\n{FIX_COPENHAGEN}\r\n")).unwrap();

        let provider = NmeaProvider::replay(path.clone(), Duration::from_millis(10));
        let (callback, mut rx) = channel_callback();
        provider.watch_position(WatchOptions::default(), callback);

        let LocationEvent::Position(first) = rx.recv().await.unwrap() else {
            panic!("expected a position");
        };
        assert_close(first.coordinate.lat, 48.1173);

        let LocationEvent::Position(second) = rx.recv().await.unwrap() else {
            panic!("expected a position");
        };
        assert_close(second.coordinate.lat, 55.675);

        assert_eq!(rx.recv().await.unwrap(), LocationEvent::Error(LocationError::PositionUnavailable));

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let provider = NmeaProvider::replay(PathBuf::from("/nonexistent/driver_console.nmea"), Duration::from_millis(10));
        let (callback, mut rx) = channel_callback();
        provider.watch_position(WatchOptions::default(), callback);

        assert_eq!(rx.recv().await.unwrap(), LocationEvent::Error(LocationError::PositionUnavailable));
    }

    #[tokio::test]
    async fn silent_stream_times_out_and_recovers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let provider = NmeaProvider::tcp(addr.to_string());
        let (callback, mut rx) = channel_callback();
        let options = WatchOptions {
            timeout: Duration::from_millis(100),
            ..Default::default()
        };
        let id = provider.watch_position(options, callback);

        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), LocationEvent::Error(LocationError::Timeout));

        stream.write_all(format!("{FIX_COPENHAGEN}\r\n").as_bytes()).await.unwrap();
        loop {
            match rx.recv().await.unwrap() {
                LocationEvent::Position(position) => {
                    assert_close(position.coordinate.lng, 12.0 + 34.1 / 60.0);
                    break;
                },
                LocationEvent::Error(err) => assert_eq!(err, LocationError::Timeout),
            }
        }

        provider.clear_watch(id);
        assert_eq!(provider.watches.active(), 0);
    }
}
