use actix_web::{http::StatusCode, test, web, App};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use vehicle_auctions::config::Config;
use vehicle_auctions::persistence::json_file;
use vehicle_auctions::web::app::{configure_app, init_app_state};
use vehicle_auctions::Repository;

fn token(sub: &str, role: &str) -> (&'static str, String) {
    let payload = json!({ "sub": sub, "name": sub, "role": role }).to_string();
    ("x-jwt-payload", general_purpose::STANDARD.encode(payload))
}

fn admin() -> (&'static str, String) {
    token("admin-1", "admin")
}

fn file(name: &str) -> Value {
    json!({
        "filename": name,
        "contentType": "image/jpeg",
        "lastModified": 1_700_000_000,
        "data": general_purpose::STANDARD.encode(name.as_bytes()),
    })
}

macro_rules! app {
    () => {
        app!(Config::default(), Repository::default())
    };
    ($config:expr, $repository:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(init_app_state(&$config, $repository).unwrap()))
                .configure(configure_app),
        )
        .await
    };
}

macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

fn new_auction() -> Value {
    json!({
        "title": "2012 Toyota Tacoma",
        "startPrice": 12_000,
        "bidIncrement": 250,
        "allowOffers": true,
        "startDate": (Utc::now() - Duration::hours(1)).to_rfc3339(),
        "endDate": (Utc::now() + Duration::days(7)).to_rfc3339(),
        "photos": { "files": [file("front.jpg"), file("rear.jpg")], "captions": ["Front"] },
    })
}

#[actix_web::test]
async fn contact_query_end_to_end() {
    let app = app!();
    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/contact/submit")
            .set_json(json!({ "name": "A", "email": "a@x.com", "userType": "bidder", "message": "help" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["query"]["status"], "new");
    let id = body["data"]["query"]["id"].as_str().unwrap().replace('-', "");
    let expected = format!("UQ{}", id[id.len() - 6..].to_uppercase());
    assert_eq!(body["data"]["query"]["queryId"], expected.as_str());
    assert_eq!(expected.len(), 8);

    let list = || test::TestRequest::get().uri("/contact/admin/queries").insert_header(admin());
    let (_, before) = call!(app, list());
    assert_eq!(before["data"]["statistics"]["resolvedQueries"], 0);
    assert_eq!(before["data"]["pagination"]["totalQueries"], 1);
    assert_eq!(before["data"]["queries"][0]["queryId"], expected.as_str());

    let (status, updated) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/contact/admin/queries/{}", body["data"]["query"]["id"].as_str().unwrap()))
            .insert_header(admin())
            .set_json(json!({ "status": "resolved", "response": "Sorted" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(updated["data"]["query"]["respondedAt"].is_string());

    let (_, after) = call!(app, list());
    assert_eq!(after["data"]["statistics"]["resolvedQueries"], 1);
    assert_eq!(after["data"]["statistics"]["responseRate"], 100.0);

    // Admins may address a query by the reference shown in the list.
    let (status, _) = call!(
        app,
        test::TestRequest::delete()
            .uri(&format!("/contact/admin/queries/{}", expected))
            .insert_header(admin())
    );
    assert_eq!(status, StatusCode::OK);
    let (_, emptied) = call!(app, list());
    assert_eq!(emptied["data"]["pagination"]["totalQueries"], 0);
}

#[actix_web::test]
async fn invalid_contact_form_lists_field_errors() {
    let app = app!();
    let (status, body) = call!(
        app,
        test::TestRequest::post().uri("/contact/submit").set_json(json!({ "name": "A", "email": "nope" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let fields: Vec<&str> = body["errors"].as_array().unwrap().iter().map(|e| e["field"].as_str().unwrap()).collect();
    assert_eq!(fields, vec!["email", "userType", "message"]);
}

#[actix_web::test]
async fn admin_routes_need_an_admin() {
    let app = app!();
    let (status, body) = call!(app, test::TestRequest::get().uri("/contact/admin/queries"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = call!(
        app,
        test::TestRequest::get().uri("/admin/dashboard").insert_header(token("b1", "bidder"))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn auction_photos_keep_submitted_order() {
    let app = app!();
    let seller = token("s1", "seller");
    let (status, created) = call!(
        app,
        test::TestRequest::post().uri("/auctions").insert_header(seller.clone()).set_json(new_auction())
    );
    assert_eq!(status, StatusCode::CREATED);
    let auction = &created["data"]["auction"];
    let id = auction["id"].as_str().unwrap().to_string();
    assert_eq!(auction["status"], "active");
    assert_eq!(auction["photos"][0]["caption"], "Front");
    assert_eq!(auction["photos"][1]["caption"], "");
    let front = auction["photos"][0]["id"].as_str().unwrap().to_string();
    let rear = auction["photos"][1]["id"].as_str().unwrap().to_string();

    let edit = json!({
        "expectedVersion": auction["version"],
        "photos": {
            "order": [
                { "id": rear, "isExisting": true },
                { "id": "new-0", "isExisting": false },
            ],
            "captions": ["Rear", "Interior"],
            "removed": [front],
            "newFiles": [file("interior.jpg")],
        }
    });
    let (status, edited) = call!(
        app,
        test::TestRequest::put().uri(&format!("/auctions/{}", id)).insert_header(seller.clone()).set_json(edit)
    );
    assert_eq!(status, StatusCode::OK);
    let photos = edited["data"]["auction"]["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 2);
    assert_eq!(photos[0]["id"], rear.as_str());
    assert_eq!(photos[0]["caption"], "Rear");
    assert_eq!(photos[1]["filename"], "interior.jpg");
    assert_eq!(photos[1]["caption"], "Interior");

    let media_url = photos[1]["url"].as_str().unwrap();
    let path = &media_url[media_url.find("/media/").unwrap()..];
    let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "interior.jpg".as_bytes());

    // Removing the last photos is refused and changes nothing.
    let empty = json!({ "photos": { "order": [], "removed": [rear] } });
    let (status, body) = call!(
        app,
        test::TestRequest::put().uri(&format!("/auctions/{}", id)).insert_header(seller.clone()).set_json(empty)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "photos");
    let (_, current) = call!(app, test::TestRequest::get().uri(&format!("/auctions/{}", id)));
    assert_eq!(current["data"]["auction"]["photos"].as_array().unwrap().len(), 2);

    // A stale version is reported as a conflict.
    let stale = json!({ "expectedVersion": 1, "title": "Renamed" });
    let (status, _) = call!(
        app,
        test::TestRequest::put().uri(&format!("/auctions/{}", id)).insert_header(seller).set_json(stale)
    );
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn bidder_withdraws_pending_offer() {
    let app = app!();
    let (_, created) = call!(
        app,
        test::TestRequest::post().uri("/auctions").insert_header(token("s1", "seller")).set_json(new_auction())
    );
    let auction_id = created["data"]["auction"]["id"].as_str().unwrap().to_string();
    let bidder = token("b1", "bidder");

    let (status, offer) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/offers/auction/{}/offer", auction_id))
            .insert_header(bidder.clone())
            .set_json(json!({ "amount": 11_000, "message": "Cash today" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(offer["data"]["offer"]["status"], "pending");
    let offer_id = offer["data"]["offer"]["id"].as_str().unwrap().to_string();
    let withdraw = || {
        test::TestRequest::post()
            .uri(&format!("/offers/auction/{}/offer/{}/withdraw", auction_id, offer_id))
            .insert_header(bidder.clone())
    };

    let (status, body) = call!(app, withdraw());
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["offer"]["status"], "withdrawn");

    let (status, body) = call!(app, withdraw());
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, mine) = call!(app, test::TestRequest::get().uri("/offers/my").insert_header(bidder.clone()));
    assert_eq!(mine["data"]["statistics"]["withdrawn"], 1);
    assert_eq!(mine["data"]["pagination"]["totalOffers"], 1);
}

#[actix_web::test]
async fn seller_accepts_offer_and_auction_is_sold() {
    let app = app!();
    let seller = token("s1", "seller");
    let (_, created) = call!(
        app,
        test::TestRequest::post().uri("/auctions").insert_header(seller.clone()).set_json(new_auction())
    );
    let auction_id = created["data"]["auction"]["id"].as_str().unwrap().to_string();

    let mut offers = Vec::new();
    for (bidder, amount) in [("b1", 11_000), ("b2", 11_500)] {
        let (_, offer) = call!(
            app,
            test::TestRequest::post()
                .uri(&format!("/offers/auction/{}/offer", auction_id))
                .insert_header(token(bidder, "bidder"))
                .set_json(json!({ "amount": amount }))
        );
        offers.push(offer["data"]["offer"]["id"].as_str().unwrap().to_string());
    }

    let (status, sold) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/offers/auction/{}/offer/{}/respond", auction_id, offers[1]))
            .insert_header(seller.clone())
            .set_json(json!({ "action": "accept" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sold["data"]["auction"]["status"], "sold");
    assert_eq!(sold["data"]["auction"]["commission"]["salePrice"]["value"], 11_500);
    assert_eq!(sold["data"]["closedOffers"][0], offers[0].as_str());

    let (_, listing) = call!(
        app,
        test::TestRequest::get().uri(&format!("/offers/auction/{}", auction_id)).insert_header(seller)
    );
    assert_eq!(listing["data"]["statistics"]["accepted"], 1);
    assert_eq!(listing["data"]["statistics"]["rejected"], 1);
}

#[actix_web::test]
async fn photos_survive_a_restart_with_a_journal() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config { data_file: Some(dir.path().join("journal.jsonl")), ..Config::default() };

    let photo_path = {
        let app = app!(config.clone(), Repository::default());
        let (status, created) = call!(
            app,
            test::TestRequest::post().uri("/auctions").insert_header(token("s1", "seller")).set_json(new_auction())
        );
        assert_eq!(status, StatusCode::CREATED);
        let url = created["data"]["auction"]["photos"][0]["url"].as_str().unwrap().to_string();
        url[url.find("/media/").unwrap()..].to_string()
    };

    let replayed = json_file::load(config.data_file.as_ref().unwrap()).unwrap();
    assert_eq!(replayed.auctions.len(), 1);
    let app = app!(config, replayed);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&photo_path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(test::read_body(resp).await, "front.jpg".as_bytes());
}

#[actix_web::test]
async fn huge_page_numbers_return_an_empty_page() {
    let app = app!();
    let (status, _) = call!(
        app,
        test::TestRequest::post().uri("/auctions").insert_header(token("s1", "seller")).set_json(new_auction())
    );
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call!(app, test::TestRequest::get().uri(&format!("/auctions?page={}", usize::MAX)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["auctions"].as_array().unwrap().len(), 0);

    let (status, body) = call!(app, test::TestRequest::get().uri("/auctions"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["auctions"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn absurd_bids_are_refused_and_the_auction_stays_readable() {
    let app = app!();
    let (_, created) = call!(
        app,
        test::TestRequest::post().uri("/auctions").insert_header(token("s1", "seller")).set_json(new_auction())
    );
    let id = created["data"]["auction"]["id"].as_str().unwrap().to_string();

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/auctions/{}/bids", id))
            .insert_header(token("b1", "bidder"))
            .set_json(json!({ "amount": i64::MAX }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");

    let (status, body) = call!(app, test::TestRequest::get().uri(&format!("/auctions/{}", id)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["auction"]["minimumNextBid"], 12_000);
}
