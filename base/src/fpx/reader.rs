use std::io::{ErrorKind::UnexpectedEof, Read as _};

use crate::defs::{Error, ErrorKind::*, IntoResult, Result};
use crate::fpx::{Compression, FacePixels, MAGIC, VERSION};

pub trait Read {
    fn read_face(&mut self) -> Result<Option<FacePixels>>;
}

pub struct Reader {
    reader: Box<dyn std::io::Read>,
    buffer: Vec<u8>,
}

impl Reader {
    pub fn new<R: std::io::Read + 'static>(mut reader: R) -> Result<Self> {
        let mut buf = [0; 4];

        reader
            .read_exact(&mut buf)
            .res(|| "failed to read .fpx magic".to_string())?;
        let val = u32::from_le_bytes(buf);
        if val != MAGIC {
            return Err(Error::new(
                MalformedData,
                format!("bad .fpx magic '{:#X}'", val),
            ));
        }

        reader
            .read_exact(&mut buf)
            .res(|| "failed to read .fpx version".to_string())?;
        let val = u32::from_le_bytes(buf);
        if val != VERSION {
            return Err(Error::new(
                UnsupportedFeature,
                format!("unsupported .fpx version '{}'", val),
            ));
        }

        reader
            .read_exact(&mut buf)
            .res(|| "failed to read .fpx compression".to_string())?;
        let val = i32::from_le_bytes(buf);

        const COMPRESSION_NONE: i32 = Compression::None as i32;
        const COMPRESSION_GZIP: i32 = Compression::Gzip as i32;

        let dec_reader: Box<dyn std::io::Read> = match val {
            COMPRESSION_NONE => Box::new(reader),
            COMPRESSION_GZIP => Box::new(flate2::read::GzDecoder::new(reader)),
            _ => {
                return Err(Error::new(
                    MalformedData,
                    format!("unknown .fpx compression '{}'", val),
                ));
            }
        };

        Ok(Self {
            reader: dec_reader,
            buffer: Vec::<u8>::with_capacity(0),
        })
    }
}

impl Read for Reader {
    fn read_face(&mut self) -> Result<Option<FacePixels>> {
        let mut buf = [0; 4];
        match self.reader.read_exact(&mut buf) {
            Err(err) => {
                return if err.kind() == UnexpectedEof {
                    Ok(None)
                } else {
                    Err(Error::with_source(
                        MalformedData,
                        "failed to read .fpx record size".to_string(),
                        err,
                    ))
                }
            }
            Ok(()) => (),
        }

        let num_pixels = u32::from_le_bytes(buf) as usize;
        self.buffer.resize(num_pixels * 3, 0);

        self.reader
            .read_exact(&mut self.buffer)
            .res(|| "failed to read .fpx record".to_string())?;

        let mut face = FacePixels::with_capacity(num_pixels);
        for sample in self.buffer.chunks_exact(3) {
            face.push([sample[0], sample[1], sample[2]]);
        }

        Ok(Some(face))
    }
}
