use server_api::CounterContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) counters: CounterContext,
}
