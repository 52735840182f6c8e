use crate::context::ServiceContext;
use crate::vectordb::VectorStore;

#[derive(Clone)]
pub struct HandlerState<S: VectorStore + Clone + 'static> {
    pub ctx: ServiceContext<S>,
}

impl<S> HandlerState<S>
where
    S: VectorStore + Clone + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }
}
