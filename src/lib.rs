pub mod dns;
pub mod parser;
pub mod settings;

pub use dns::{
    encode_header, encode_message, encode_name, encode_question, encode_record, Header, Message,
    Question, ResourceRecord,
};
pub use parser::{decode_header, decode_message, decode_name, decode_question, decode_record};
