mod common;

use common::*;
use keystache_broker::application::broker::Broker;
use keystache_broker::config::BrokerConfig;
use keystache_broker::domain::request::InboundRequest;
use keystache_broker::domain::verdict::{OutboundResponse, PayInvoiceOutcome};
use std::sync::Arc;

use PayInvoiceOutcome::{Denied, Failed, Paid};

fn broker_with(emitter: &RecordingEmitter) -> Broker {
    Broker::new(Arc::new(emitter.clone()), BrokerConfig::default())
}

#[tokio::test]
async fn test_no_handlers_denies() {
    let emitter = RecordingEmitter::new();
    let broker = broker_with(&emitter);

    let outcome = broker.handle_pay_invoice(pay_request("lnbc1")).await.unwrap();

    assert_eq!(outcome, Denied);
    let responses = emitter.responses();
    assert_eq!(responses.len(), 1);
    assert!(!responses[0].approved());
}

#[tokio::test]
async fn test_paid_wins_and_stops_polling() {
    let emitter = RecordingEmitter::new();
    let broker = broker_with(&emitter);
    let log = call_log();
    broker.register_pay_invoice_handler(pay_handler("denied", Denied, &log));
    broker.register_pay_invoice_handler(pay_handler("failed", Failed, &log));
    broker.register_pay_invoice_handler(pay_handler("paid", Paid, &log));

    let outcome = broker.handle_pay_invoice(pay_request("lnbc2")).await.unwrap();

    assert_eq!(outcome, Paid);
    assert_eq!(calls(&log).last(), Some(&"paid"));
    assert_eq!(
        emitter.responses(),
        vec![OutboundResponse::pay_invoice("lnbc2", Paid)]
    );
}

#[tokio::test]
async fn test_failed_without_paid() {
    let emitter = RecordingEmitter::new();
    let broker = broker_with(&emitter);
    let log = call_log();
    broker.register_pay_invoice_handler(pay_handler("denied", Denied, &log));
    broker.register_pay_invoice_handler(pay_handler("failed", Failed, &log));

    let outcome = broker.handle_pay_invoice(pay_request("lnbc3")).await.unwrap();

    assert_eq!(outcome, Failed);
    assert_eq!(calls(&log).len(), 2);
    let responses = emitter.responses();
    assert_eq!(responses, vec![OutboundResponse::pay_invoice("lnbc3", Failed)]);
    assert!(!responses[0].approved());
}

#[tokio::test]
async fn test_all_denied() {
    let emitter = RecordingEmitter::new();
    let broker = broker_with(&emitter);
    let log = call_log();
    broker.register_pay_invoice_handler(pay_handler("a", Denied, &log));
    broker.register_pay_invoice_handler(pay_handler("b", Denied, &log));

    let outcome = broker.handle_pay_invoice(pay_request("lnbc4")).await.unwrap();

    assert_eq!(outcome, Denied);
    assert_eq!(calls(&log).len(), 2);
}

#[tokio::test]
async fn test_handle_routes_by_request_kind() {
    let emitter = RecordingEmitter::new();
    let broker = broker_with(&emitter);
    let log = call_log();
    broker.register_pay_invoice_handler(pay_handler("paid", Paid, &log));

    let response = broker
        .handle(InboundRequest::PayInvoice(pay_request("lnbc5")))
        .await
        .unwrap();
    assert_eq!(response, OutboundResponse::pay_invoice("lnbc5", Paid));

    let response = broker
        .handle(InboundRequest::SignEvent(sign_request("e1")))
        .await
        .unwrap();
    assert!(!response.approved());
    assert_eq!(emitter.responses().len(), 2);
}

#[tokio::test]
async fn test_faulting_handlers_do_not_block_payment() {
    let emitter = RecordingEmitter::new();
    let broker = broker_with(&emitter);
    let log = call_log();
    broker.register_pay_invoice_handler(failing_pay_handler("broken", &log));
    broker.register_pay_invoice_handler(panicking_pay_handler("panics", &log));
    broker.register_pay_invoice_handler(pay_handler("paid", Paid, &log));

    let outcome = broker.handle_pay_invoice(pay_request("lnbc6")).await.unwrap();

    assert_eq!(outcome, Paid);
    assert_eq!(calls(&log).last(), Some(&"paid"));
    assert_eq!(
        emitter.responses(),
        vec![OutboundResponse::pay_invoice("lnbc6", Paid)]
    );
}

#[tokio::test]
async fn test_faulting_handlers_leave_failed_outcome() {
    let emitter = RecordingEmitter::new();
    let broker = broker_with(&emitter);
    let log = call_log();
    broker.register_pay_invoice_handler(failing_pay_handler("broken", &log));
    broker.register_pay_invoice_handler(panicking_pay_handler("panics", &log));
    broker.register_pay_invoice_handler(pay_handler("failed", Failed, &log));

    let outcome = broker.handle_pay_invoice(pay_request("lnbc7")).await.unwrap();

    assert_eq!(outcome, Failed);
    assert_eq!(calls(&log).len(), 3);
    let responses = emitter.responses();
    assert_eq!(responses, vec![OutboundResponse::pay_invoice("lnbc7", Failed)]);
    assert!(!responses[0].approved());
}

#[tokio::test]
async fn test_only_faulting_handlers_deny() {
    let emitter = RecordingEmitter::new();
    let broker = broker_with(&emitter);
    let log = call_log();
    broker.register_pay_invoice_handler(failing_pay_handler("broken", &log));
    broker.register_pay_invoice_handler(panicking_pay_handler("panics", &log));

    let outcome = broker.handle_pay_invoice(pay_request("lnbc8")).await.unwrap();

    assert_eq!(outcome, Denied);
    assert_eq!(calls(&log).len(), 2);
}
