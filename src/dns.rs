pub mod client;
pub mod codec;
pub mod error;

pub use codec::Codec;
pub use error::{EncodingError, Error, Section, UnknownMnemonic};

use bytes::BufMut;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

pub const HEADER_LEN: usize = 12;
pub const MAX_LABEL_LEN: usize = 63;
/// Wire length of a name, including the terminating zero byte.
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_UDP_MESSAGE_LEN: usize = 512;
pub const MAX_MESSAGE_LEN: usize = 65535;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    /// A standard query with recursion desired, as sent by a stub resolver.
    pub fn query(id: u16, question: Question) -> Self {
        Message {
            header: Header {
                id,
                recursion_desired: true,
                qd_count: 1,
                ..Header::default()
            },
            questions: vec![question],
            answers: vec![],
            authorities: vec![],
            additionals: vec![],
        }
    }

    /// Rewrites the header counts from the section lengths.
    pub fn with_recomputed_counts(mut self) -> Self {
        let count = |len: usize| u16::try_from(len).unwrap_or(u16::MAX);

        self.header.qd_count = count(self.questions.len());
        self.header.an_count = count(self.answers.len());
        self.header.ns_count = count(self.authorities.len());
        self.header.ar_count = count(self.additionals.len());
        self
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, Error> {
        Vec::try_from(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub qr: Qr,
    pub opcode: OpCode,
    pub authoritative_answer: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    /// Reserved bits as received from the peer. They are always sent as zero.
    pub z: u8,
    pub response_code: ResponseCode,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: DomainName,
    pub query_type: QueryType,
    pub query_class: QueryClass,
}

impl Question {
    pub fn new(name: impl Into<DomainName>, query_type: QueryType, query_class: QueryClass) -> Self {
        Self {
            name: name.into(),
            query_type,
            query_class,
        }
    }
}

/// Generic record envelope. The RDLENGTH field is always derived from
/// `rdata`, so both can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub record_type: QueryType,
    pub class: QueryClass,
    /// Seconds the record may be cached, 0 means it must not be cached.
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl ResourceRecord {
    pub fn a(name: impl Into<DomainName>, ttl: u32, addr: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            record_type: QueryType::A,
            class: QueryClass::IN,
            ttl,
            rdata: addr.octets().to_vec(),
        }
    }

    pub fn aaaa(name: impl Into<DomainName>, ttl: u32, addr: Ipv6Addr) -> Self {
        Self {
            name: name.into(),
            record_type: QueryType::AAAA,
            class: QueryClass::IN,
            ttl,
            rdata: addr.octets().to_vec(),
        }
    }

    pub fn rd_length(&self) -> usize {
        self.rdata.len()
    }

    /// The address carried by an `IN A` record.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        if self.record_type != QueryType::A || self.class != QueryClass::IN {
            return None;
        }
        <[u8; 4]>::try_from(self.rdata.as_slice())
            .ok()
            .map(Ipv4Addr::from)
    }

    /// The address carried by an `IN AAAA` record.
    pub fn ipv6(&self) -> Option<Ipv6Addr> {
        if self.record_type != QueryType::AAAA || self.class != QueryClass::IN {
            return None;
        }
        <[u8; 16]>::try_from(self.rdata.as_slice())
            .ok()
            .map(Ipv6Addr::from)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        labels(&self.0)
    }
}

fn labels(name: &str) -> impl Iterator<Item = &str> {
    name.split('.').filter(|label| !label.is_empty())
}

impl From<&str> for DomainName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for DomainName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<&str> for DomainName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Qr {
    #[default]
    Query,
    Response,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum OpCode {
    #[default]
    StandardQuery,
    InverseQuery,
    Status,
    Notify,
    Update,
    Reserved(u8),
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ResponseCode {
    #[default]
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Reserved(u8),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueryType {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    ALL,
    Unknown(u16),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QueryClass {
    IN,
    CS,
    CH,
    HS,
    ANY,
    Unknown(u16),
}

pub fn encode_name(name: &str) -> Result<Vec<u8>, Error> {
    let mut raw = Vec::new();
    put_name(&mut raw, name)?;
    Ok(raw)
}

pub fn encode_header(header: &Header) -> Result<Vec<u8>, Error> {
    let mut raw = Vec::with_capacity(HEADER_LEN);
    put_header(&mut raw, header)?;
    Ok(raw)
}

pub fn encode_question(question: &Question) -> Result<Vec<u8>, Error> {
    let mut raw = Vec::new();
    put_question(&mut raw, question)?;
    Ok(raw)
}

pub fn encode_record(record: &ResourceRecord) -> Result<Vec<u8>, Error> {
    let mut raw = Vec::new();
    put_record(&mut raw, record)?;
    Ok(raw)
}

pub fn encode_message(message: &Message) -> Result<Vec<u8>, Error> {
    Vec::try_from(message)
}

impl TryFrom<&Message> for Vec<u8> {
    type Error = Error;

    fn try_from(message: &Message) -> Result<Self, Self::Error> {
        let header = &message.header;
        check_count(Section::Question, header.qd_count, message.questions.len())?;
        check_count(Section::Answer, header.an_count, message.answers.len())?;
        check_count(Section::Authority, header.ns_count, message.authorities.len())?;
        check_count(Section::Additional, header.ar_count, message.additionals.len())?;

        let mut raw_message = Vec::with_capacity(MAX_UDP_MESSAGE_LEN);
        put_header(&mut raw_message, header)?;

        for question in &message.questions {
            put_question(&mut raw_message, question)?;
        }

        let records = message
            .answers
            .iter()
            .chain(&message.authorities)
            .chain(&message.additionals);
        for rr in records {
            put_record(&mut raw_message, rr)?;
        }

        Ok(raw_message)
    }
}

fn check_count(section: Section, declared: u16, actual: usize) -> Result<(), Error> {
    if usize::from(declared) == actual {
        Ok(())
    } else {
        Err(Error::InvalidState {
            section,
            declared,
            actual,
        })
    }
}

fn four_bit_code(field: &'static str, value: u8) -> Result<u16, EncodingError> {
    if value > 0x0F {
        return Err(EncodingError::CodeOutOfRange { field, value });
    }
    Ok(u16::from(value))
}

fn put_header(raw: &mut Vec<u8>, header: &Header) -> Result<(), EncodingError> {
    let opcode = four_bit_code("opcode", header.opcode.into())?;
    let rcode = four_bit_code("rcode", header.response_code.into())?;

    raw.put_u16(header.id);

    // the reserved Z bits (6..4) stay zero
    let mut flags: u16 = 0;
    flags |= (u16::from(header.qr) << 15) & 0b1000000000000000;
    flags |= (opcode << 11) & 0b0111100000000000;
    flags |= ((header.authoritative_answer as u16) << 10) & 0b0000010000000000;
    flags |= ((header.truncated as u16) << 9) & 0b0000001000000000;
    flags |= ((header.recursion_desired as u16) << 8) & 0b0000000100000000;
    flags |= ((header.recursion_available as u16) << 7) & 0b0000000010000000;
    flags |= rcode & 0b0000000000001111;
    raw.put_u16(flags);

    raw.put_u16(header.qd_count);
    raw.put_u16(header.an_count);
    raw.put_u16(header.ns_count);
    raw.put_u16(header.ar_count);

    Ok(())
}

fn put_name(raw: &mut Vec<u8>, name: &str) -> Result<(), EncodingError> {
    let start = raw.len();

    for label in labels(name) {
        let bytes = label.as_bytes();
        if bytes.len() > MAX_LABEL_LEN {
            return Err(EncodingError::LabelTooLong {
                label: label.to_string(),
                len: bytes.len(),
            });
        }
        raw.put_u8(bytes.len() as u8);
        raw.put_slice(bytes);
    }

    if raw.len() == start {
        return Err(EncodingError::EmptyName);
    }

    // null termination
    raw.put_u8(0);

    let len = raw.len() - start;
    if len > MAX_NAME_LEN {
        return Err(EncodingError::NameTooLong(len));
    }

    Ok(())
}

fn put_question(raw: &mut Vec<u8>, question: &Question) -> Result<(), EncodingError> {
    put_name(raw, question.name.as_str())?;
    raw.put_u16(question.query_type.into());
    raw.put_u16(question.query_class.into());

    Ok(())
}

fn put_record(raw: &mut Vec<u8>, rr: &ResourceRecord) -> Result<(), EncodingError> {
    let rd_length =
        u16::try_from(rr.rdata.len()).map_err(|_| EncodingError::RdataTooLong(rr.rdata.len()))?;

    put_name(raw, rr.name.as_str())?;
    raw.put_u16(rr.record_type.into());
    raw.put_u16(rr.class.into());
    raw.put_u32(rr.ttl);
    raw.put_u16(rd_length);
    raw.put_slice(&rr.rdata);

    Ok(())
}

impl From<bool> for Qr {
    fn from(is_response: bool) -> Self {
        if is_response {
            Qr::Response
        } else {
            Qr::Query
        }
    }
}

impl From<Qr> for u16 {
    fn from(value: Qr) -> Self {
        match value {
            Qr::Response => 1,
            Qr::Query => 0,
        }
    }
}

impl From<u8> for OpCode {
    fn from(code: u8) -> Self {
        match code {
            0 => OpCode::StandardQuery,
            1 => OpCode::InverseQuery,
            2 => OpCode::Status,
            4 => OpCode::Notify,
            5 => OpCode::Update,
            v => OpCode::Reserved(v),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(code: OpCode) -> Self {
        match code {
            OpCode::StandardQuery => 0,
            OpCode::InverseQuery => 1,
            OpCode::Status => 2,
            OpCode::Notify => 4,
            OpCode::Update => 5,
            OpCode::Reserved(code) => code,
        }
    }
}

impl From<u8> for ResponseCode {
    fn from(code: u8) -> Self {
        match code {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormatError,
            2 => ResponseCode::ServerFailure,
            3 => ResponseCode::NameError,
            4 => ResponseCode::NotImplemented,
            5 => ResponseCode::Refused,
            v => ResponseCode::Reserved(v),
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(value: ResponseCode) -> Self {
        match value {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Reserved(v) => v,
        }
    }
}

impl From<u16> for QueryType {
    fn from(value: u16) -> Self {
        match value {
            1 => QueryType::A,
            2 => QueryType::NS,
            //NOTE: 3 and 4 Obsolete
            5 => QueryType::CNAME,
            6 => QueryType::SOA,
            12 => QueryType::PTR,
            15 => QueryType::MX,
            16 => QueryType::TXT,
            28 => QueryType::AAAA,
            255 => QueryType::ALL,
            t => QueryType::Unknown(t),
        }
    }
}

impl From<QueryType> for u16 {
    fn from(value: QueryType) -> u16 {
        match value {
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::CNAME => 5,
            QueryType::SOA => 6,
            QueryType::PTR => 12,
            QueryType::MX => 15,
            QueryType::TXT => 16,
            QueryType::AAAA => 28,
            QueryType::ALL => 255,
            QueryType::Unknown(t) => t,
        }
    }
}

impl From<u16> for QueryClass {
    fn from(value: u16) -> Self {
        match value {
            1 => QueryClass::IN,
            2 => QueryClass::CS,
            3 => QueryClass::CH,
            4 => QueryClass::HS,
            255 => QueryClass::ANY,
            c => QueryClass::Unknown(c),
        }
    }
}

impl From<QueryClass> for u16 {
    fn from(value: QueryClass) -> Self {
        match value {
            QueryClass::IN => 1,
            QueryClass::CS => 2,
            QueryClass::CH => 3,
            QueryClass::HS => 4,
            QueryClass::ANY => 255,
            QueryClass::Unknown(c) => c,
        }
    }
}

impl FromStr for QueryType {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let query_type = match upper.as_str() {
            "A" => QueryType::A,
            "NS" => QueryType::NS,
            "CNAME" => QueryType::CNAME,
            "SOA" => QueryType::SOA,
            "PTR" => QueryType::PTR,
            "MX" => QueryType::MX,
            "TXT" => QueryType::TXT,
            "AAAA" => QueryType::AAAA,
            "ALL" | "ANY" => QueryType::ALL,
            other => other
                .strip_prefix("TYPE")
                .unwrap_or(other)
                .parse::<u16>()
                .map(QueryType::from)
                .map_err(|_| UnknownMnemonic {
                    kind: "record type",
                    value: s.to_string(),
                })?,
        };
        Ok(query_type)
    }
}

impl FromStr for QueryClass {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let query_class = match upper.as_str() {
            "IN" => QueryClass::IN,
            "CS" => QueryClass::CS,
            "CH" => QueryClass::CH,
            "HS" => QueryClass::HS,
            "ANY" => QueryClass::ANY,
            other => other
                .strip_prefix("CLASS")
                .unwrap_or(other)
                .parse::<u16>()
                .map(QueryClass::from)
                .map_err(|_| UnknownMnemonic {
                    kind: "record class",
                    value: s.to_string(),
                })?,
        };
        Ok(query_class)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Unknown(t) => write!(f, "TYPE{}", t),
            QueryType::ALL => f.write_str("ANY"),
            known => write!(f, "{:?}", known),
        }
    }
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryClass::Unknown(c) => write!(f, "CLASS{}", c),
            known => write!(f, "{:?}", known),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpCode::StandardQuery => f.write_str("QUERY"),
            OpCode::InverseQuery => f.write_str("IQUERY"),
            OpCode::Status => f.write_str("STATUS"),
            OpCode::Notify => f.write_str("NOTIFY"),
            OpCode::Update => f.write_str("UPDATE"),
            OpCode::Reserved(code) => write!(f, "RESERVED{}", code),
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::NoError => f.write_str("NOERROR"),
            ResponseCode::FormatError => f.write_str("FORMERR"),
            ResponseCode::ServerFailure => f.write_str("SERVFAIL"),
            ResponseCode::NameError => f.write_str("NXDOMAIN"),
            ResponseCode::NotImplemented => f.write_str("NOTIMP"),
            ResponseCode::Refused => f.write_str("REFUSED"),
            ResponseCode::Reserved(code) => write!(f, "RESERVED{}", code),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {}, rcode: {}, id: {}",
            self.opcode, self.response_code, self.id
        )?;

        let flags = [
            (self.qr == Qr::Response, "qr"),
            (self.authoritative_answer, "aa"),
            (self.truncated, "tc"),
            (self.recursion_desired, "rd"),
            (self.recursion_available, "ra"),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(" ");

        write!(
            f,
            ";; flags: {} ; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            flags, self.qd_count, self.an_count, self.ns_count, self.ar_count
        )
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ";; {}.\t{}\t{}",
            self.name, self.query_class, self.query_type
        )
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.\t{}\t{}\t{}\t",
            self.name, self.ttl, self.class, self.record_type
        )?;

        if let Some(addr) = self.ipv4() {
            return write!(f, "{}", addr);
        }
        if let Some(addr) = self.ipv6() {
            return write!(f, "{}", addr);
        }

        // generic presentation of unknown RDATA, RFC 3597 section 5
        write!(f, "\\# {}", self.rdata.len())?;
        if !self.rdata.is_empty() {
            f.write_str(" ")?;
            for byte in &self.rdata {
                write!(f, "{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;

        writeln!(f, ";; QUESTION SECTION:")?;
        for question in &self.questions {
            writeln!(f, "{}", question)?;
        }

        let sections = [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authorities),
            ("ADDITIONAL", &self.additionals),
        ];
        for (title, records) in sections {
            if records.is_empty() {
                continue;
            }
            writeln!(f, "\n;; {} SECTION:", title)?;
            for rr in records {
                writeln!(f, "{}", rr)?;
            }
        }

        Ok(())
    }
}
