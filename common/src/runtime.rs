extern crate tokio;

use std::sync::Arc;
use tokio::runtime::Runtime;
use crate::error::Errno;

#[derive(Debug, Clone)]
pub struct Executor {
    runtime: Arc<Runtime>,
}

impl Executor{
    pub fn create() -> Result<Self, Errno> {
        let runtime = Runtime::new()?;
        Ok(Executor {
            runtime: Arc::new(runtime),
        })
    }

    // all the commands are blocking, one request at a time.
    pub fn create_single_threaded() -> Result<Self, Errno> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Executor{
            runtime: Arc::new(runtime),
        })
    }

    pub fn get_runtime(&self) -> &Runtime {
        &self.runtime
    }
}
