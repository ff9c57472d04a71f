//! HID report framing
//!
//! A message is split into 64-byte reports. The first report carries the
//! header `?##`, the message type (u16 big-endian) and the payload length
//! (u32 big-endian); continuation reports start with a single `?`. Unused
//! report bytes are zero.

use crate::error::{Error, Result};
use crate::types::{MAX_MESSAGE_SIZE, REPORT_SIZE};

const REPORT_MAGIC: u8 = b'?';
const HEADER_MAGIC: [u8; 2] = [b'#', b'#'];
const HEADER_LEN: usize = 1 + 2 + 2 + 4;

pub type Report = [u8; REPORT_SIZE];

/// Split a message into HID reports
pub fn encode_reports(msg_type: u16, payload: &[u8]) -> Result<Vec<Report>> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(Error::MessageTooLarge(payload.len()));
    }

    let mut data = Vec::with_capacity(HEADER_LEN - 1 + payload.len());
    data.extend_from_slice(&HEADER_MAGIC);
    data.extend_from_slice(&msg_type.to_be_bytes());
    data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    data.extend_from_slice(payload);

    let reports = data
        .chunks(REPORT_SIZE - 1)
        .map(|chunk| {
            let mut report = [0u8; REPORT_SIZE];
            report[0] = REPORT_MAGIC;
            report[1..=chunk.len()].copy_from_slice(chunk);
            report
        })
        .collect();

    Ok(reports)
}

/// Collects reports until a full message is available
#[derive(Debug, Default)]
pub struct Reassembler {
    header: Option<(u16, usize)>,
    buffer: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one report; returns the message once its payload is complete
    pub fn push(&mut self, report: &[u8]) -> Result<Option<(u16, Vec<u8>)>> {
        let Some((&magic, body)) = report.split_first() else {
            return Err(Error::MalformedReport);
        };
        if magic != REPORT_MAGIC {
            return Err(Error::MalformedReport);
        }

        let body = match self.header {
            Some(_) => body,
            None => {
                if body.len() < HEADER_LEN - 1 || body[..2] != HEADER_MAGIC {
                    return Err(Error::MalformedReport);
                }
                let msg_type = u16::from_be_bytes([body[2], body[3]]);
                let len = u32::from_be_bytes([body[4], body[5], body[6], body[7]]) as usize;
                if len > MAX_MESSAGE_SIZE {
                    return Err(Error::MessageTooLarge(len));
                }
                self.header = Some((msg_type, len));
                self.buffer.clear();
                self.buffer.reserve(len);
                &body[HEADER_LEN - 1..]
            }
        };

        let Some((msg_type, len)) = self.header else {
            return Err(Error::MalformedReport);
        };
        let wanted = len - self.buffer.len();
        self.buffer.extend_from_slice(&body[..wanted.min(body.len())]);

        if self.buffer.len() < len {
            return Ok(None);
        }

        self.header = None;
        Ok(Some((msg_type, std::mem::take(&mut self.buffer))))
    }
}
