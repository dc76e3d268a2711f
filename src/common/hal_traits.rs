// src/common/hal_traits.rs

use core::fmt::Debug;

/// Abstraction for synchronous (non-blocking) serial communication with the sensor.
///
/// The driver never opens, configures or closes the port. Baud rate and pin
/// selection are the caller's business.
pub trait TfSerial {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Attempts to read a single byte from the serial interface.
    ///
    /// Returns `Ok(byte)` if a byte was read, or `Err(nb::Error::WouldBlock)`
    /// if no byte is available yet. Other errors are returned as `Err(nb::Error::Other(Self::Error))`.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Attempts to write a single byte to the serial interface.
    ///
    /// Returns `Ok(())` if the byte was accepted for transmission, or `Err(nb::Error::WouldBlock)`
    /// if the write buffer is full.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Attempts to flush the transmit buffer, ensuring all written bytes have been sent.
    fn flush(&mut self) -> nb::Result<(), Self::Error>;
}

// Lets a driver borrow a port it does not own.
impl<T: TfSerial + ?Sized> TfSerial for &mut T {
    type Error = T::Error;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        (**self).flush()
    }
}

/// Abstraction for asynchronous serial communication (requires 'async' feature).
#[cfg(feature = "async")]
#[allow(async_fn_in_trait)]
pub trait TfSerialAsync {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Reads a single byte, waiting until one arrives.
    async fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Writes every byte of `bytes`.
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Waits until all written bytes have left the transmitter.
    async fn flush(&mut self) -> Result<(), Self::Error>;
}

#[cfg(feature = "async")]
impl<T: TfSerialAsync + ?Sized> TfSerialAsync for &mut T {
    type Error = T::Error;

    async fn read_byte(&mut self) -> Result<u8, Self::Error> {
        (**self).read_byte().await
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write_all(bytes).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush().await
    }
}

/// Adapts an `embedded-io` UART to [`TfSerial`].
///
/// `ReadReady` stands in for a "bytes available" query, so `read_byte` never
/// blocks inside the HAL.
#[cfg(feature = "embedded-io")]
#[derive(Debug)]
pub struct IoSerial<T>(pub T);

#[cfg(feature = "embedded-io")]
impl<T> IoSerial<T> {
    pub fn new(inner: T) -> Self {
        IoSerial(inner)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(feature = "embedded-io")]
impl<T> TfSerial for IoSerial<T>
where
    T: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write,
{
    type Error = T::Error;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        if !self.0.read_ready().map_err(nb::Error::Other)? {
            return Err(nb::Error::WouldBlock);
        }
        let mut byte = [0u8; 1];
        match self.0.read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        match self.0.write(&[byte]) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(_) => Ok(()),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.0.flush().map_err(nb::Error::Other)
    }
}

/// Adapts an `embedded-io-async` UART to [`TfSerialAsync`].
#[cfg(feature = "embedded-io-async")]
#[derive(Debug)]
pub struct IoSerialAsync<T>(pub T);

#[cfg(feature = "embedded-io-async")]
impl<T> IoSerialAsync<T> {
    pub fn new(inner: T) -> Self {
        IoSerialAsync(inner)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(feature = "embedded-io-async")]
impl<T> TfSerialAsync for IoSerialAsync<T>
where
    T: embedded_io_async::Read + embedded_io_async::Write,
{
    type Error = T::Error;

    async fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut byte = [0u8; 1];
        // Read resolves once at least one byte is in, so loop only on a 0-length read.
        loop {
            if self.0.read(&mut byte).await? == 1 {
                return Ok(byte[0]);
            }
        }
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(bytes).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush().await
    }
}

#[cfg(all(test, feature = "embedded-io"))]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[derive(Default)]
    struct MockPort {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        flushed: bool,
    }

    impl embedded_io::ErrorType for MockPort {
        type Error = core::convert::Infallible;
    }

    impl embedded_io::Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl embedded_io::ReadReady for MockPort {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.rx.is_empty())
        }
    }

    impl embedded_io::Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushed = true;
            Ok(())
        }
    }

    #[test]
    fn test_io_serial_reads_one_byte_at_a_time() {
        let port = MockPort { rx: VecDeque::from([0x59, 0x59]), ..Default::default() };
        let mut serial = IoSerial::new(port);
        assert_eq!(serial.read_byte(), Ok(0x59));
        assert_eq!(serial.read_byte(), Ok(0x59));
        assert_eq!(serial.read_byte(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_io_serial_writes_and_flushes() {
        let mut serial = IoSerial::new(MockPort::default());
        serial.write_byte(0x5A).unwrap();
        serial.write_byte(0x04).unwrap();
        serial.flush().unwrap();
        let port = serial.into_inner();
        assert_eq!(port.tx, [0x5A, 0x04]);
        assert!(port.flushed);
    }

    #[test]
    fn test_mut_ref_forwards() {
        let port = MockPort { rx: VecDeque::from([0x01]), ..Default::default() };
        let mut serial = IoSerial::new(port);
        let mut borrowed = &mut serial;
        assert_eq!(TfSerial::read_byte(&mut borrowed), Ok(0x01));
    }
}

#[cfg(all(test, feature = "embedded-io-async"))]
mod async_tests {
    use super::*;
    use crate::driver::{mock::MockDelay, TfMiniSAsync};
    use embassy_futures::block_on;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[derive(Default)]
    struct MockPortAsync {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        flushed: bool,
    }

    impl embedded_io_async::ErrorType for MockPortAsync {
        type Error = core::convert::Infallible;
    }

    impl embedded_io_async::Read for MockPortAsync {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl embedded_io_async::Write for MockPortAsync {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushed = true;
            Ok(())
        }
    }

    #[test]
    fn test_io_serial_async_reads_and_writes() {
        let port = MockPortAsync { rx: VecDeque::from([0x59, 0x5A]), ..Default::default() };
        let mut serial = IoSerialAsync::new(port);
        assert_eq!(block_on(serial.read_byte()), Ok(0x59));
        assert_eq!(block_on(serial.read_byte()), Ok(0x5A));
        block_on(serial.write_all(&[0x5A, 0x04, 0x04, 0x62])).unwrap();
        block_on(TfSerialAsync::flush(&mut serial)).unwrap();
        let port = serial.into_inner();
        assert_eq!(port.tx, [0x5A, 0x04, 0x04, 0x62]);
        assert!(port.flushed);
    }

    #[test]
    fn test_io_serial_async_drives_save_settings() {
        let port = MockPortAsync {
            rx: VecDeque::from([0x5A, 0x05, 0x11, 0x00, 0x70]),
            ..Default::default()
        };
        let mut tf = TfMiniSAsync::new(IoSerialAsync::new(port), MockDelay::default());
        assert_eq!(block_on(tf.save_settings()), Ok(()));
        let (serial, _) = tf.release();
        let port = serial.into_inner();
        assert_eq!(port.tx, [0x5A, 0x04, 0x11, 0x6F]);
        assert!(port.flushed);
    }
}
