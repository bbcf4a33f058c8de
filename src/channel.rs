use crate::command::ChannelWriter;
use crate::config::SerialConfig;
use crate::error::{Error, Result};
use crate::stream_reader::{StreamReader, spawn_reader};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, StopBits};
use tracing::info;

/// An open byte channel: the writer commands send through, plus the stream
/// reader already draining the other direction.
pub struct Link {
    pub(crate) writer: ChannelWriter,
    pub(crate) stream: StreamReader,
}

impl Link {
    /// Open the serial device described by `serial`.
    pub fn open(serial: &SerialConfig) -> Result<Self> {
        let data_bits = match serial.bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => return Err(Error::Config(format!("unsupported data bits: {other}"))),
        };
        let parity = if serial.parity { Parity::Even } else { Parity::None };

        let port = tokio_serial::new(&serial.device, serial.speed)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(StopBits::One)
            .open_native_async()
            .map_err(|e| {
                Error::channel(
                    format!("could not open serial port {}", serial.device),
                    e.into(),
                )
            })?;

        info!("Connected to {} at {} baud", serial.device, serial.speed);
        Ok(Self::from_stream(port))
    }

    /// Wrap any duplex byte stream, e.g. a TCP connection or an in-memory
    /// `tokio::io::duplex` pair standing in for a device.
    pub fn from_stream<C>(stream: C) -> Self
    where
        C: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            writer: Box::new(writer),
            stream: spawn_reader(reader),
        }
    }
}
