use crate::{
    dns::{self, MAX_UDP_MESSAGE_LEN},
    parser,
};

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use std::io;

/// Frames exactly one DNS message per datagram.
#[derive(Debug, Clone)]
pub struct Codec {
    max_message_len: usize,
}

impl Codec {
    pub fn new(max_message_len: usize) -> Self {
        Self { max_message_len }
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(MAX_UDP_MESSAGE_LEN)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dns(#[from] dns::Error),
}

/// Each datagram decodes to its own result, so a broken datagram can be
/// judged by its sender before it ends the stream.
impl Decoder for Codec {
    type Item = Result<dns::Message, dns::Error>;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.is_empty() {
            return Ok(None);
        }

        log::debug!("Unpacking DNS message of {} bytes.", buf.len());

        // a datagram is never continued by the next one, so whatever happens
        // the buffer is consumed here
        let datagram = buf.split();
        Ok(Some(parser::decode_message_with_limit(
            &datagram,
            self.max_message_len,
        )))
    }
}

impl Encoder<dns::Message> for Codec {
    type Error = Error;

    fn encode(&mut self, msg: dns::Message, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let data = msg.to_vec()?;
        // TODO: set the TC bit and cut the message at the last complete
        // record instead of refusing to send it
        if data.len() > self.max_message_len {
            return Err(dns::Error::MessageTooLarge {
                len: data.len(),
                max: self.max_message_len,
            }
            .into());
        }

        log::debug!("Packing DNS message of {} bytes.", data.len());

        buf.reserve(data.len());
        buf.put_slice(&data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{QueryClass, QueryType, Question, ResourceRecord};

    use std::net::Ipv4Addr;

    fn query() -> dns::Message {
        dns::Message::query(
            1234,
            Question::new("example.test.com", QueryType::A, QueryClass::IN),
        )
    }

    #[test]
    fn empty_buffer() {
        let mut codec = Codec::default();
        let mut buf = BytesMut::new();

        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_then_decode_datagram() {
        let mut codec = Codec::default();
        let mut buf = BytesMut::new();

        codec.encode(query(), &mut buf).unwrap();
        let result = codec.decode(&mut buf).unwrap();

        assert_eq!(result, Some(Ok(query())));
        assert!(buf.is_empty());
    }

    #[test]
    fn short_datagram_is_an_error() {
        let mut codec = Codec::default();
        let mut buf = BytesMut::new();

        let raw_query = query().to_vec().unwrap();
        buf.put_slice(&raw_query[0..11]);

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some(Err(dns::Error::TruncatedMessage)));
        // the broken datagram must not poison the next one
        assert!(buf.is_empty());

        buf.put_slice(&raw_query);
        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some(Ok(query())));
    }

    #[test]
    fn datagram_cut_inside_question() {
        let mut codec = Codec::default();
        let mut buf = BytesMut::new();

        let raw_query = query().to_vec().unwrap();
        buf.put_slice(&raw_query[0..21]);

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some(Err(dns::Error::TruncatedMessage)));
    }

    #[test]
    fn oversized_datagram() {
        let mut codec = Codec::new(32);
        let mut buf = BytesMut::new();
        buf.put_slice(&[0u8; 33]);

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(
            result,
            Some(Err(dns::Error::MessageTooLarge { len: 33, max: 32 }))
        );
    }

    #[test]
    fn refuses_to_encode_oversized_message() {
        let mut codec = Codec::default();
        let mut buf = BytesMut::new();

        let mut msg = query();
        for i in 0..40 {
            msg.answers.push(ResourceRecord::a(
                "example.test.com",
                60,
                Ipv4Addr::new(10, 0, 0, i),
            ));
        }
        let msg = msg.with_recomputed_counts();

        let result = codec.encode(msg, &mut buf);
        assert!(matches!(
            result,
            Err(Error::Dns(dns::Error::MessageTooLarge { max: 512, .. }))
        ));
        assert!(buf.is_empty());
    }
}
