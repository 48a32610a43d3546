//! Decoding of raw DNS messages, as described in
//! [RFC 1035](https://tools.ietf.org/html/rfc1035#section-4.1).
//!
//! All parsers are `nom` streaming parsers, so running out of input shows up
//! as `Incomplete` and is reported as [`Error::TruncatedMessage`].

use crate::dns::{
    DomainName, Error, Header, Message, Question, ResourceRecord, HEADER_LEN, MAX_LABEL_LEN,
    MAX_MESSAGE_LEN, MAX_NAME_LEN,
};

use nom::{
    bits::{bits, streaming::take as take_bits},
    bytes::streaming::take,
    combinator::map,
    error::{ErrorKind, ParseError},
    multi::{count, length_data},
    number::streaming::{be_u16, be_u32, be_u8},
    sequence::tuple,
    ErrorConvert, IResult,
};

/// A label length byte with both top bits set starts a compression pointer.
const POINTER_MASK: u8 = 0b1100_0000;

/// Smallest possible wire size of a question: root name, type and class.
const MIN_QUESTION_LEN: usize = 1 + 4;
/// Smallest possible wire size of a resource record: root name, type, class,
/// ttl and rdlength.
const MIN_RECORD_LEN: usize = 1 + 10;

#[derive(Debug, Clone, PartialEq)]
enum Failure {
    Nom(ErrorKind),
    CompressedLabel,
    LabelTooLong(u8),
    NameTooLong,
}

impl<I> ParseError<I> for Failure {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        Failure::Nom(kind)
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl ErrorConvert<Failure> for Failure {
    fn convert(self) -> Failure {
        self
    }
}

type ParseResult<'a, T> = IResult<&'a [u8], T, Failure>;

type BitInput<'a> = (&'a [u8], usize);

fn into_error(err: nom::Err<Failure>) -> Error {
    match err {
        nom::Err::Incomplete(_) => Error::TruncatedMessage,
        nom::Err::Error(failure) | nom::Err::Failure(failure) => match failure {
            Failure::CompressedLabel => Error::UnsupportedCompression,
            Failure::LabelTooLong(len) => {
                Error::MalformedName(format!("label length {} exceeds {}", len, MAX_LABEL_LEN))
            }
            Failure::NameTooLong => {
                Error::MalformedName(format!("name exceeds {} bytes", MAX_NAME_LEN))
            }
            Failure::Nom(kind) => Error::InvalidHeader(format!("unexpected input ({:?})", kind)),
        },
    }
}

fn take_one_bit(input: BitInput) -> IResult<BitInput, u8, Failure> {
    take_bits(1usize)(input)
}

fn take_three_bits(input: BitInput) -> IResult<BitInput, u8, Failure> {
    take_bits(3usize)(input)
}

fn take_four_bits(input: BitInput) -> IResult<BitInput, u8, Failure> {
    take_bits(4usize)(input)
}

fn header(input: &[u8]) -> ParseResult<'_, Header> {
    let mut parser = tuple((
        be_u16,
        bits(tuple((
            take_one_bit,
            take_four_bits,
            take_one_bit,
            take_one_bit,
            take_one_bit,
            take_one_bit,
            take_three_bits,
            take_four_bits,
        ))),
        be_u16,
        be_u16,
        be_u16,
        be_u16,
    ));

    let (input, (id, (qr, opcode, aa, tc, rd, ra, z, rcode), qd_count, an_count, ns_count, ar_count)) =
        parser(input)?;

    Ok((
        input,
        Header {
            id,
            qr: (qr != 0).into(),
            opcode: opcode.into(),
            authoritative_answer: aa != 0,
            truncated: tc != 0,
            recursion_desired: rd != 0,
            recursion_available: ra != 0,
            z,
            response_code: rcode.into(),
            qd_count,
            an_count,
            ns_count,
            ar_count,
        },
    ))
}

/// One length prefixed label, `None` for the terminating root label.
fn label(input: &[u8]) -> ParseResult<'_, Option<&[u8]>> {
    let (input, len) = be_u8(input)?;

    match len {
        0 => Ok((input, None)),
        len if len & POINTER_MASK == POINTER_MASK => {
            // TODO: follow pointers once decoding takes the whole message
            // as context, see RFC 1035 section 4.1.4
            Err(nom::Err::Failure(Failure::CompressedLabel))
        }
        len if usize::from(len) > MAX_LABEL_LEN => {
            Err(nom::Err::Failure(Failure::LabelTooLong(len)))
        }
        len => map(take(len), Some)(input),
    }
}

fn domain_name(mut input: &[u8]) -> ParseResult<'_, DomainName> {
    let mut labels = Vec::new();
    // the terminating zero byte counts as well
    let mut wire_len = 1;

    loop {
        let (rem, label) = label(input)?;
        input = rem;

        let Some(label) = label else {
            break;
        };

        wire_len += 1 + label.len();
        if wire_len > MAX_NAME_LEN {
            return Err(nom::Err::Failure(Failure::NameTooLong));
        }
        labels.push(String::from_utf8_lossy(label));
    }

    Ok((input, DomainName::from(labels.join("."))))
}

fn question(input: &[u8]) -> ParseResult<'_, Question> {
    let (input, (name, qtype, qclass)) = tuple((domain_name, be_u16, be_u16))(input)?;

    Ok((
        input,
        Question {
            name,
            query_type: qtype.into(),
            query_class: qclass.into(),
        },
    ))
}

fn resource_record(input: &[u8]) -> ParseResult<'_, ResourceRecord> {
    let (input, (name, rtype, rclass, ttl, rdata)) =
        tuple((domain_name, be_u16, be_u16, be_u32, length_data(be_u16)))(input)?;

    Ok((
        input,
        ResourceRecord {
            name,
            record_type: rtype.into(),
            class: rclass.into(),
            ttl,
            rdata: rdata.to_vec(),
        },
    ))
}

/// Rejects headers announcing more entries than the largest accepted
/// message could ever hold.
fn check_counts(header: &Header, max_len: usize) -> Result<(), Error> {
    let records = usize::from(header.an_count)
        + usize::from(header.ns_count)
        + usize::from(header.ar_count);
    let min_len = usize::from(header.qd_count) * MIN_QUESTION_LEN + records * MIN_RECORD_LEN;
    let capacity = max_len.saturating_sub(HEADER_LEN);

    if min_len > capacity {
        return Err(Error::InvalidHeader(format!(
            "{} questions and {} records need at least {} bytes, but at most {} can follow the header",
            header.qd_count, records, min_len, capacity
        )));
    }

    Ok(())
}

/// Decodes the domain name starting at `offset` and returns it together with
/// the number of bytes it occupies, including the terminating zero byte.
pub fn decode_name(buf: &[u8], offset: usize) -> Result<(DomainName, usize), Error> {
    let input = buf.get(offset..).ok_or(Error::TruncatedMessage)?;
    let (rem, name) = domain_name(input).map_err(into_error)?;

    Ok((name, input.len() - rem.len()))
}

pub fn decode_header(buf: &[u8]) -> Result<Header, Error> {
    let (_, header) = header(buf).map_err(into_error)?;

    Ok(header)
}

pub fn decode_question(buf: &[u8], offset: usize) -> Result<(Question, usize), Error> {
    let input = buf.get(offset..).ok_or(Error::TruncatedMessage)?;
    let (rem, question) = question(input).map_err(into_error)?;

    Ok((question, input.len() - rem.len()))
}

pub fn decode_record(buf: &[u8], offset: usize) -> Result<(ResourceRecord, usize), Error> {
    let input = buf.get(offset..).ok_or(Error::TruncatedMessage)?;
    let (rem, rr) = resource_record(input).map_err(into_error)?;

    Ok((rr, input.len() - rem.len()))
}

pub fn decode_message(buf: &[u8]) -> Result<Message, Error> {
    decode_message_with_limit(buf, MAX_MESSAGE_LEN)
}

/// Decodes a complete message received in a single datagram. Buffers longer
/// than `max_len` are rejected before any parsing happens. Bytes following
/// the last announced record are ignored.
pub fn decode_message_with_limit(buf: &[u8], max_len: usize) -> Result<Message, Error> {
    if buf.len() > max_len {
        return Err(Error::MessageTooLarge {
            len: buf.len(),
            max: max_len,
        });
    }

    let (input, header) = header(buf).map_err(into_error)?;
    check_counts(&header, max_len)?;

    let (_, (questions, answers, authorities, additionals)) = tuple((
        count(question, header.qd_count.into()),
        count(resource_record, header.an_count.into()),
        count(resource_record, header.ns_count.into()),
        count(resource_record, header.ar_count.into()),
    ))(input)
    .map_err(into_error)?;

    Ok(Message {
        header,
        questions,
        answers,
        authorities,
        additionals,
    })
}
