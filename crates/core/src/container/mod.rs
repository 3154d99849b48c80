pub mod injector;
pub mod registry;

pub use injector::{
    is_reserved, Extras, InjectFuture, Injectable, Injected, Injector, APP, PAYLOAD, REQUEST,
    RESERVED_NAMES, RESPONSE,
};
pub use registry::{downcast, ServiceEntry, ServiceRegistry, ServiceValue};
