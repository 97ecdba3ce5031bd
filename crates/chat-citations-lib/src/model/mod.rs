pub mod conversation_turn;
pub mod message;
pub mod search_record;
