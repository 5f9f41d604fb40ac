use super::*;

fn stub_create_steps(transport: &MockTransport) {
    transport.stub(
        "POST",
        "/contacts",
        serde_json::json!({ "id": 10, "name": "Ada", "phone": "0600000000" }),
    );
    transport.stub(
        "POST",
        "/locations",
        serde_json::json!({
            "id": 11,
            "locationName": "Depot",
            "latitude": 52.0,
            "longitude": 5.1
        }),
    );
    let mut created = order(42, true, "Ring twice");
    created.contact_id = 10;
    created.location_id = 11;
    created.driver_id = 2;
    transport.stub("POST", "/orders", serde_json::to_value(created).unwrap());
}

#[tokio::test]
async fn add_order_runs_the_three_steps_in_order() {
    let (transport, cache, manager) = create_test_manager();
    transport.stub("GET", "/orders", serde_json::json!([]));
    cache.query(Endpoint::Orders).await.unwrap();
    stub_create_steps(&transport);

    let created = manager.add_order(sample_form()).await.unwrap();
    assert_eq!(created.id, 42);
    assert!(created.active);

    let posts: Vec<String> = transport
        .requests()
        .into_iter()
        .filter(|request| request.method == "POST")
        .map(|request| request.path)
        .collect();
    assert_eq!(posts, ["/contacts", "/locations", "/orders"]);

    // The order body references the two freshly assigned ids
    let order_post = transport
        .requests()
        .into_iter()
        .find(|request| request.method == "POST" && request.path == "/orders")
        .unwrap();
    let body = order_post.body.unwrap();
    assert_eq!(body["contactId"], 10);
    assert_eq!(body["locationId"], 11);
    assert_eq!(body["active"], true);
    assert!(body.get("id").is_none());

    // The new row is mirrored into the normalized slot right away
    let data = cache.peek(Endpoint::Orders).unwrap();
    assert_eq!(data.as_orders().unwrap().ids(), &[42]);
}

#[tokio::test]
async fn add_order_invalidates_the_order_lists() {
    let (transport, cache, manager) = create_test_manager();
    transport.stub("GET", "/orders", serde_json::json!([]));
    cache.query(Endpoint::Orders).await.unwrap();
    stub_create_steps(&transport);

    manager.add_order(sample_form()).await.unwrap();

    // The list slot went stale, so the next query refetches
    let gets_before = transport
        .requests()
        .iter()
        .filter(|request| request.method == "GET")
        .count();
    cache.query(Endpoint::Orders).await.unwrap();
    let gets_after = transport
        .requests()
        .iter()
        .filter(|request| request.method == "GET")
        .count();
    assert_eq!(gets_after, gets_before + 1);
}

#[tokio::test]
async fn add_order_aborts_when_a_middle_step_fails() {
    let (transport, cache, manager) = create_test_manager();
    transport.stub(
        "GET",
        "/orders",
        serde_json::to_value(vec![order(1, true, "")]).unwrap(),
    );
    let before = cache.query(Endpoint::Orders).await.unwrap();
    transport.stub(
        "POST",
        "/contacts",
        serde_json::json!({ "id": 10, "name": "Ada" }),
    );
    transport.fail("POST", "/locations");

    let error = manager.add_order(sample_form()).await.unwrap_err();
    assert!(matches!(
        error,
        CoreError::PartialCreate {
            step: CreateStep::Location,
            ..
        }
    ));

    // The order step was never attempted
    assert!(
        !transport
            .requests()
            .iter()
            .any(|request| request.method == "POST" && request.path == "/orders")
    );

    // No optimistic state, and the list tag was not invalidated:
    // the next query is still a cache hit
    let after = cache.query(Endpoint::Orders).await.unwrap();
    assert!(Arc::ptr_eq(&after, &before));
    let gets = transport
        .requests()
        .iter()
        .filter(|request| request.method == "GET")
        .count();
    assert_eq!(gets, 1);
}

#[tokio::test]
async fn add_order_rejects_invalid_input_before_any_network_call() {
    let (transport, _cache, manager) = create_test_manager();
    let mut form = sample_form();
    form.contact.name = String::new();

    let error = manager.add_order(form).await.unwrap_err();
    assert!(matches!(error, CoreError::Validation(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn add_contact_posts_the_body_without_an_id() {
    let (transport, _cache, manager) = create_test_manager();
    transport.stub(
        "POST",
        "/contacts",
        serde_json::json!({ "id": 10, "name": "Ada" }),
    );

    let contact = manager
        .add_contact(NewContact {
            name: "Ada".into(),
            email: None,
            phone: None,
        })
        .await
        .unwrap();
    assert_eq!(contact.id, 10);

    let post = transport.requests().into_iter().next().unwrap();
    assert_eq!(post.body, Some(serde_json::json!({ "name": "Ada" })));
}

#[tokio::test]
async fn add_location_validates_coordinates() {
    let (transport, _cache, manager) = create_test_manager();
    let error = manager
        .add_location(NewLocation {
            location_name: "Nowhere".into(),
            address_line1: None,
            city: None,
            zip_code: None,
            latitude: 123.0,
            longitude: 5.1,
        })
        .await
        .unwrap_err();
    assert!(matches!(error, CoreError::Validation(_)));
    assert!(transport.requests().is_empty());
}
