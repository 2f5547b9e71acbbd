mod support;

use serde_json::json;
use society_app_core::{
    Action, ActionFamily, AppKernel, Delivery, ResourceKey, ResourceKind, ResourceRequest,
    ResourceVerb, RootState, SessionAction, SlicePhase, Status, Store,
};
use society_core::{PhoneNumber, Tenant};
use support::ScriptedGateway;
use tokio::runtime::Handle;

const UNITS: ResourceKey = ResourceKey::new(ResourceKind::Units, ResourceVerb::List);
const BLOCKS: ResourceKey = ResourceKey::new(ResourceKind::Blocks, ResourceVerb::List);

fn kernel_with(gateway: std::sync::Arc<ScriptedGateway>) -> AppKernel {
    AppKernel::new(Store::default(), gateway, Handle::current())
}

#[tokio::test]
async fn newer_request_wins_when_older_resolves_last() {
    let (gateway, mut calls) = ScriptedGateway::new();
    let mut kernel = kernel_with(gateway);

    kernel.dispatch(Action::resource(UNITS, ResourceRequest::list().with_param("page", "1")));
    let first = calls.recv().await.unwrap();
    kernel.dispatch(Action::resource(UNITS, ResourceRequest::list().with_param("page", "2")));
    let second = calls.recv().await.unwrap();
    assert_eq!(kernel.state().resource_status(UNITS), Status::Pending);

    second.resolve(json!(["page 2"]));
    assert_eq!(
        kernel.process_next().await,
        Some(Delivery::Applied(ActionFamily::Resource(UNITS)))
    );
    first.resolve(json!(["page 1"]));
    assert_eq!(
        kernel.process_next().await,
        Some(Delivery::Discarded(ActionFamily::Resource(UNITS)))
    );

    let state = kernel.state();
    let slice = state.resource(UNITS).unwrap();
    assert_eq!(slice.status, Status::Complete);
    assert_eq!(slice.data, json!(["page 2"]));
}

#[tokio::test]
async fn stale_result_arriving_first_is_dropped() {
    let (gateway, mut calls) = ScriptedGateway::new();
    let mut kernel = kernel_with(gateway);

    kernel.dispatch(Action::resource(UNITS, ResourceRequest::list()));
    let first = calls.recv().await.unwrap();
    kernel.dispatch(Action::resource(UNITS, ResourceRequest::list()));
    let second = calls.recv().await.unwrap();

    first.reject("stale failure");
    assert!(matches!(
        kernel.process_next().await,
        Some(Delivery::Discarded(_))
    ));
    assert_eq!(kernel.state().resource_status(UNITS), Status::Pending);
    assert_eq!(kernel.state().resource(UNITS).unwrap().error, None);

    second.resolve(json!({ "total": 3 }));
    kernel.settle().await;
    assert_eq!(kernel.state().resource(UNITS).unwrap().data, json!({ "total": 3 }));
    assert_eq!(kernel.in_flight(), 0);
}

#[tokio::test]
async fn families_do_not_supersede_each_other() {
    let (gateway, mut calls) = ScriptedGateway::new();
    let mut kernel = kernel_with(gateway);

    kernel.dispatch(Action::resource(UNITS, ResourceRequest::list()));
    let units = calls.recv().await.unwrap();
    kernel.dispatch(Action::resource(BLOCKS, ResourceRequest::list()));
    let blocks = calls.recv().await.unwrap();
    assert_eq!(blocks.request.url, "/blocks");

    blocks.reject("Blocks unavailable");
    units.resolve(json!([]));
    kernel.settle().await;

    let state = kernel.state();
    assert_eq!(state.resource_status(UNITS), Status::Complete);
    assert_eq!(state.resource_status(BLOCKS), Status::Failed);
    assert_eq!(
        state.resource(BLOCKS).unwrap().error.as_deref(),
        Some("Blocks unavailable")
    );
}

#[tokio::test]
async fn reset_while_pending_drops_the_result() {
    let (gateway, mut calls) = ScriptedGateway::new();
    let mut kernel = kernel_with(gateway);

    kernel.dispatch(Action::resource(UNITS, ResourceRequest::list()));
    let call = calls.recv().await.unwrap();
    kernel.dispatch(Action::reset_resource(UNITS));
    assert_eq!(kernel.state().resource_status(UNITS), Status::Idle);
    assert_eq!(kernel.in_flight(), 0);

    call.resolve(json!(["late"]));
    assert!(matches!(
        kernel.process_next().await,
        Some(Delivery::Discarded(_))
    ));
    assert_eq!(kernel.state().resource_status(UNITS), Status::Idle);
}

#[tokio::test]
async fn logout_forgets_every_in_flight_request() {
    let (gateway, mut calls) = ScriptedGateway::new();
    let mut kernel = kernel_with(gateway);

    kernel.dispatch(Action::send_otp(
        PhoneNumber::parse("9876543210").unwrap(),
        Tenant::Global,
    ));
    let otp = calls.recv().await.unwrap();
    kernel.dispatch(Action::resource(UNITS, ResourceRequest::list()));
    let units = calls.recv().await.unwrap();

    kernel.dispatch(Action::Session(SessionAction::LoggedOut));
    assert_eq!(kernel.in_flight(), 0);

    otp.resolve(json!(null));
    units.resolve(json!([1]));
    assert!(matches!(kernel.process_next().await, Some(Delivery::Discarded(_))));
    assert!(matches!(kernel.process_next().await, Some(Delivery::Discarded(_))));
    assert_eq!(kernel.state(), RootState::default());
}

#[tokio::test]
async fn tick_applies_only_arrived_completions() {
    let (gateway, mut calls) = ScriptedGateway::new();
    let mut kernel = kernel_with(gateway);

    kernel.dispatch(Action::resource(UNITS, ResourceRequest::list()));
    let call = calls.recv().await.unwrap();
    assert_eq!(kernel.tick(), 0);

    call.resolve(json!([]));
    while kernel.tick() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(kernel.state().resource_status(UNITS), Status::Complete);
    assert!(!kernel.is_in_flight(ActionFamily::Resource(UNITS)));
}

#[tokio::test]
async fn id_verb_without_id_fails_without_calling_backend() {
    let (gateway, mut calls) = ScriptedGateway::new();
    let mut kernel = kernel_with(gateway);
    let delete = ResourceKey::new(ResourceKind::Notices, ResourceVerb::Delete);

    kernel.dispatch(Action::resource(delete, ResourceRequest::list()));
    kernel.settle().await;

    let state = kernel.state();
    assert_eq!(state.resource_status(delete), Status::Failed);
    assert!(calls.try_recv().is_err());

    kernel.dispatch(Action::Resource(delete, SlicePhase::Reset));
    assert_eq!(kernel.state().resource_status(delete), Status::Idle);
}
