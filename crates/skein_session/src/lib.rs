mod boundary;
pub use boundary::{action_from_dom_payload, action_from_network_payload};

mod engine;
pub use engine::{Session, SessionHandle};

mod gateway;
pub use gateway::{
    HttpPersistenceGateway, PersistenceGateway, batch_save_request, chat_save_request,
    message_save_request,
};
