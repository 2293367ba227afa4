//! BDD test world for entrada service

use std::sync::Arc;

use cucumber::World;
use entrada::config::ApiConfig;
use entrada::entry_api::EntryApi;
use entrada::pipeline::Pipeline;
use entrada::state::{new_state_handle, StateHandle};

use crate::doubles::{FakeCatalog, RecordingHub};

#[derive(Debug, Default, World)]
pub struct EntradaWorld {
    pub catalog: FakeCatalog,
    pub state: Option<StateHandle>,

    // Lifecycle testing
    pub hub: Option<Arc<RecordingHub>>,
    pub hub_refuses: bool,
    pub announcements: Vec<String>,

    // Dashboard testing
    pub response_body: Option<String>,
}

impl EntradaWorld {
    pub fn state(&mut self) -> StateHandle {
        Arc::clone(self.state.get_or_insert_with(|| new_state_handle(100)))
    }

    pub fn pipeline(&mut self) -> Pipeline {
        let api = EntryApi::new(&ApiConfig::default(), Arc::new(self.catalog.clone()));
        Pipeline::new(Arc::new(api), self.state(), "sendEpc")
    }
}
