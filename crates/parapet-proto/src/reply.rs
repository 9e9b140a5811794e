// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Tagged reply frames on the child → parent stream.

use std::os::unix::io::RawFd;

use crate::error::FrameError;
use crate::frame::{PlainAlloc, read_str, write_str};
use crate::io::{FullRead, read_full, write_full};

const TAG_VERDICT: u8 = 0;
const TAG_STATUS: u8 = 1;

/// One decoded reply from the verification child.
///
/// The wire carries a leading tag byte; unknown tags break the channel.
/// The verdict never carries more than the boolean — failure reasons stay
/// in the child's log.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Reply {
    /// Final answer for the oldest outstanding request.
    Verdict(bool),
    /// Progress line from a continuous backend (e.g. fingerprint scan
    /// state); purely informational.
    Status(String),
}

/// Encodes and writes one reply frame.
pub fn write_reply(fd: RawFd, reply: &Reply) -> Result<(), FrameError> {
    match reply {
        Reply::Verdict(ok) => {
            write_full(fd, &[TAG_VERDICT, *ok as u8])?;
        }
        Reply::Status(text) => {
            write_full(fd, &[TAG_STATUS])?;
            write_str(fd, text.as_bytes())?;
        }
    }

    Ok(())
}

/// Reads and decodes exactly one reply frame.
///
/// Only call this with a reply owed — the parent gates the read on the
/// reactor's readiness notification, so EOF here means the child died
/// mid-conversation.
pub fn read_reply(fd: RawFd) -> Result<Reply, FrameError> {
    let mut tag = [0u8; 1];
    if read_full(fd, &mut tag)? == FullRead::Eof {
        return Err(FrameError::UnexpectedEof);
    }

    match tag[0] {
        TAG_VERDICT => {
            let mut byte = [0u8; 1];
            if read_full(fd, &mut byte)? == FullRead::Eof {
                return Err(FrameError::UnexpectedEof);
            }
            Ok(Reply::Verdict(byte[0] != 0))
        }
        TAG_STATUS => {
            let text = match read_str(fd, &PlainAlloc)? {
                Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                None => String::new(),
            };
            Ok(Reply::Status(text))
        }
        unknown => Err(FrameError::UnknownTag(unknown)),
    }
}
