//! Shared fixtures

use models::{Class, ClassRef, Instance, ObserverHandler, Result, TypeRef, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Print engine events when `RUST_LOG` asks for them.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_test_writer())
        .try_init();
}

pub fn animal() -> ClassRef {
    Class::model("Animal")
        .shape(|s| Some(s.field("name", TypeRef::String)))
        .build()
}

pub fn person() -> ClassRef {
    let animal = animal();
    Class::model("Person")
        .shape(move |s| {
            Some(
                s.field("name", TypeRef::String)
                    .field("age", TypeRef::Number)
                    .field("pet", TypeRef::Class(animal.clone())),
            )
        })
        .build()
}

/// Writes every notification it receives to a shared log.
#[derive(Clone, Default)]
pub struct Recorder {
    pub log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl ObserverHandler for Recorder {
    fn on_peek(&self, _instance: &Instance, name: &str) -> Result<()> {
        self.log.borrow_mut().push(format!("peek {}", name));
        Ok(())
    }

    fn on_poke(&self, _instance: &Instance, name: &str, new: &Value, old: &Value) -> Result<()> {
        self.log
            .borrow_mut()
            .push(format!("poke {} {:?} {:?}", name, new, old));
        Ok(())
    }

    fn on_splice(&self, _collection: &Instance, added: &[Value], removed: &[Value]) -> Result<()> {
        self.log
            .borrow_mut()
            .push(format!("splice {:?} {:?}", added, removed));
        Ok(())
    }
}
