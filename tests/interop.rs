use std::net::Ipv4Addr;

use hickory_proto::op::{Message as TestMessage, MessageType, OpCode as TestOpCode, Query};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::BinEncodable;

use dnsr::{
    dns::{self, Header, Message, QueryClass, QueryType, Qr, Question, ResourceRecord},
    parser,
};

#[test]
fn test_client_reads_our_query() {
    let query = Message::query(
        4321,
        Question::new("dns.google.com", QueryType::AAAA, QueryClass::IN),
    );

    let raw = query.to_vec().unwrap();
    let parsed = TestMessage::from_vec(&raw).unwrap();

    assert_eq!(parsed.id(), 4321);
    assert_eq!(parsed.message_type(), MessageType::Query);
    assert_eq!(parsed.op_code(), TestOpCode::Query);
    assert!(parsed.recursion_desired());
    assert!(!parsed.truncated());
    assert_eq!(parsed.queries().len(), 1);

    let question = &parsed.queries()[0];
    assert_eq!(question.name(), &Name::from_ascii("dns.google.com.").unwrap());
    assert_eq!(question.query_type(), RecordType::AAAA);
    assert_eq!(question.query_class(), DNSClass::IN);
}

#[test]
fn test_client_reads_our_response() {
    let response = Message {
        header: Header {
            id: 99,
            qr: Qr::Response,
            recursion_desired: true,
            recursion_available: true,
            ..Header::default()
        },
        questions: vec![Question::new("example.com", QueryType::A, QueryClass::IN)],
        answers: vec![ResourceRecord::a(
            "example.com",
            3600,
            Ipv4Addr::new(93, 184, 216, 34),
        )],
        authorities: vec![],
        additionals: vec![],
    }
    .with_recomputed_counts();

    let raw = dns::encode_message(&response).unwrap();
    let parsed = TestMessage::from_vec(&raw).unwrap();

    assert_eq!(parsed.message_type(), MessageType::Response);
    assert!(parsed.recursion_available());
    assert_eq!(parsed.answers().len(), 1);

    let answer = &parsed.answers()[0];
    assert_eq!(answer.name(), &Name::from_ascii("example.com.").unwrap());
    assert_eq!(answer.ttl(), 3600);
    match answer.data() {
        Some(RData::A(addr)) => assert_eq!(addr.0, Ipv4Addr::new(93, 184, 216, 34)),
        other => panic!("unexpected record data {:?}", other),
    }
}

#[test]
fn we_read_a_test_client_query() {
    let mut query = TestMessage::new();
    query
        .set_id(77)
        .set_message_type(MessageType::Query)
        .set_op_code(TestOpCode::Query)
        .set_recursion_desired(true);
    query.add_query(Query::query(
        Name::from_ascii("www.example.com.").unwrap(),
        RecordType::MX,
    ));

    let raw = query.to_vec().unwrap();
    let msg = parser::decode_message(&raw).unwrap();

    assert_eq!(msg.header.id, 77);
    assert_eq!(msg.header.qr, Qr::Query);
    assert!(msg.header.recursion_desired);
    assert_eq!(
        msg.questions,
        vec![Question::new("www.example.com", QueryType::MX, QueryClass::IN)]
    );
    assert_eq!(msg.to_vec().unwrap(), raw);
}

#[test]
fn we_refuse_a_compressed_response() {
    let name = Name::from_ascii("www.example.com.").unwrap();

    let mut response = TestMessage::new();
    response
        .set_id(78)
        .set_message_type(MessageType::Response)
        .set_op_code(TestOpCode::Query);
    response.add_query(Query::query(name.clone(), RecordType::A));
    response.add_answer(Record::from_rdata(
        name,
        60,
        RData::A(A(Ipv4Addr::new(192, 0, 2, 1))),
    ));

    // the answer owner name is written as a pointer to the question
    let raw = response.to_vec().unwrap();

    assert_eq!(
        parser::decode_message(&raw),
        Err(dns::Error::UnsupportedCompression)
    );
}
