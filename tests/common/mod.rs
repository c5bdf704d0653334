#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use ducklet::{ConnectionFacade, Row, Value};
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

/// Log sink shared between a test and the facade it drives.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn dispatch(&self) -> Dispatch {
        Dispatch::new(
            tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish(),
        )
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(|poison| poison.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

pub struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|poison| poison.into_inner());
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// In-memory facade logging into a fresh capture buffer.
pub fn captured_facade() -> (ConnectionFacade, CapturedLogs) {
    let logs = CapturedLogs::default();
    let facade = ConnectionFacade::builder().dispatch(logs.dispatch()).build();
    (facade, logs)
}

pub fn row(pairs: Vec<(&str, Value)>) -> Row {
    Row::from_pairs(pairs).expect("test rows have unique columns")
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}
