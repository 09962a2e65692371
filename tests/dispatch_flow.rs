//! End-to-end dispatch through the reqwest funnel client.

use serde_json::json;

use funnel_dispatch::{DispatchError, Dispatcher, Endpoint, FormPayload, LoginType};

mod common;

#[tokio::test]
async fn test_single_node_call_forwards_form() {
    let node = common::start_funnel_node(200, 0).await;
    let other = common::start_funnel_node(200, 0).await;

    let config = common::zf_config(vec![node.url(), other.url()]);
    let dispatcher = Dispatcher::from_config(&config).unwrap();

    let form = FormPayload::new()
        .with("type", "ZF")
        .with("username", "2021001")
        .with("password", "p@ss word");
    let result = dispatcher
        .dispatch(&form, Some(&node.url()), &Endpoint::new("/student/library/borrow"))
        .await;

    assert_eq!(result, Ok(json!({ "code": 200 })));
    assert_eq!(node.calls(), 1);
    assert_eq!(other.calls(), 0);

    let request = &node.requests()[0];
    assert!(request.starts_with("POST /student/library/borrow HTTP/1.1"));
    assert!(request.contains("application/x-www-form-urlencoded"));
    assert!(request.contains("type=ZF"));
    assert!(request.contains("username=2021001"));
    assert!(request.contains("password=p%40ss+word"));
}

#[tokio::test]
async fn test_single_node_maps_codes_without_retry() {
    for (code, expected) in [
        (412, Err(DispatchError::WrongPassword)),
        (416, Err(DispatchError::OAuthNotUpdated)),
        (413, Err(DispatchError::ServerError)),
        (415, Err(DispatchError::ServerError)),
    ] {
        let node = common::start_funnel_node(code, 0).await;
        let config = common::zf_config(vec![node.url()]);
        let dispatcher = Dispatcher::from_config(&config).unwrap();

        let result = dispatcher
            .dispatch(
                &FormPayload::new().with("type", "ZF"),
                Some(&node.url()),
                &Endpoint::new("/student/card/info"),
            )
            .await;

        assert_eq!(result, expected, "code {}", code);
        assert_eq!(node.calls(), 1, "exactly one call for code {}", code);
        assert_eq!(
            dispatcher.balance().nodes(LoginType::Zf)[0].consecutive_failures,
            0,
            "single mode leaves the breaker alone"
        );
    }
}

#[tokio::test]
async fn test_hedged_success_returns_winner_data() {
    let busy = common::start_funnel_node(413, 0).await;
    let winner = common::start_funnel_node(200, 50).await;

    let config = common::zf_config(vec![busy.url(), winner.url()]);
    let dispatcher = Dispatcher::from_config(&config).unwrap();

    let result = dispatcher
        .dispatch(
            &FormPayload::new().with("type", "ZF"),
            None,
            &Endpoint::new("/student/zf/score"),
        )
        .await;

    assert_eq!(result, Ok(json!({ "code": 200 })));
    assert_eq!(busy.calls(), 1);
    assert_eq!(winner.calls(), 1);
    let nodes = dispatcher.balance().nodes(LoginType::Zf);
    assert_eq!(nodes[0].consecutive_failures, 1);
    assert_eq!(nodes[1].consecutive_failures, 0);
}

#[tokio::test]
async fn test_hedged_oauth_uses_oauth_pool() {
    let zf_node = common::start_funnel_node(200, 0).await;
    let oauth_node = common::start_funnel_node(200, 0).await;

    let mut config = common::zf_config(vec![zf_node.url()]);
    config.pools.oauth = vec![oauth_node.url()];
    let dispatcher = Dispatcher::from_config(&config).unwrap();

    let result = dispatcher
        .dispatch(
            &FormPayload::new().with("type", "OAUTH"),
            None,
            &Endpoint::new("/student/zf/exam"),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(oauth_node.calls(), 1);
    assert_eq!(zf_node.calls(), 0);
}

#[tokio::test]
async fn test_preferred_node_outside_pool_is_raced() {
    let pooled = common::start_funnel_node(413, 0).await;
    let preferred = common::start_funnel_node(200, 20).await;

    let config = common::zf_config(vec![pooled.url()]);
    let dispatcher = Dispatcher::from_config(&config).unwrap();

    let result = dispatcher
        .dispatch(
            &FormPayload::new().with("type", "ZF"),
            Some(&preferred.url()),
            &Endpoint::new("/student/zf/score"),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(preferred.calls(), 1);
    assert_eq!(pooled.calls(), 1);
}
