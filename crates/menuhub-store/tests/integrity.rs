use menuhub_store::{
    add_order_line, add_owner, append_status_event, delete_address, delete_category, delete_city,
    delete_menu_item, delete_order, delete_order_status, delete_restaurant, delete_state,
    delete_status_catalog, delete_user, get_city, insert_address, insert_category, insert_city,
    insert_comment, insert_menu_item, insert_order, insert_restaurant, insert_state, insert_user,
    order_status_by_label, status_catalog_by_label, status_history, ConstraintKind, StoreError,
};
use menuhub_types::{
    NewAddress, NewCity, NewComment, NewMenuItem, NewOrder, NewOrderMenuItem, NewRestaurant,
    NewState, NewUser, Price, StatusLabel,
};
use rusqlite::Connection;

const MISSING: i64 = 9_999;

fn migrated() -> Connection {
    let conn = Connection::open_in_memory().expect("failed to open db");
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .expect("failed to enable foreign keys");
    menuhub_db::run_migrations(&conn, menuhub_db::bundled_migrations_dir())
        .expect("failed to run migrations");
    conn
}

fn assert_foreign_key<T: std::fmt::Debug>(result: Result<T, StoreError>, what: &str) {
    let err = result.expect_err(what);
    assert_eq!(
        err.constraint_kind(),
        Some(ConstraintKind::ForeignKey),
        "{what}: unexpected error {err:?}"
    );
}

fn row_exists(conn: &Connection, table: &str, id: i64) -> bool {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM \"{table}\" WHERE id = ?1)"),
        [id],
        |row| row.get(0),
    )
    .expect("failed to check row")
}

fn timestamp() -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 5, 4)
        .and_then(|d| d.and_hms_opt(18, 0, 0))
        .expect("valid timestamp")
}

struct Graph {
    state_id: i64,
    city_id: i64,
    address_id: i64,
    user_id: i64,
    restaurant_id: i64,
    category_id: i64,
    menu_item_id: i64,
    comment_id: i64,
    order_status_id: i64,
    order_id: i64,
}

fn graph(conn: &Connection) -> Graph {
    let state = insert_state(
        conn,
        &NewState {
            name: "Texas".into(),
            code: "TX".into(),
            country: "US".into(),
        },
    )
    .expect("failed to insert state");
    let city = insert_city(
        conn,
        &NewCity {
            name: "Austin".into(),
            zipcode: 73301,
            address: "301 W 2nd St".into(),
            state_id: state.id,
            country: "US".into(),
        },
    )
    .expect("failed to insert city");
    let address = insert_address(
        conn,
        &NewAddress {
            street_address: "500 Congress Ave".into(),
            city_id: city.id,
            postal_code: 78701,
        },
    )
    .expect("failed to insert address");
    let user = insert_user(
        conn,
        &NewUser {
            name: "Grace".into(),
            contact_phone: "555-0199".into(),
            personal_email: "grace@home.example".into(),
            email: "grace@work.example".into(),
            password: "hash".into(),
            address_id: address.id,
        },
    )
    .expect("failed to insert user");
    let restaurant = insert_restaurant(
        conn,
        &NewRestaurant {
            name: "Congress Tacos".into(),
            street_address: "500 Congress Ave".into(),
            address_id: address.id,
            city_id: city.id,
        },
    )
    .expect("failed to insert restaurant");
    let category = insert_category(conn, "Tacos").expect("failed to insert category");
    let item = insert_menu_item(
        conn,
        &NewMenuItem {
            restaurant_id: restaurant.id,
            category_id: category.id,
            name: "Al pastor".into(),
            ingredients: "pork, pineapple, tortilla".into(),
            price: Price::from_minor_units(450),
        },
    )
    .expect("failed to insert menu item");
    let pending = order_status_by_label(conn, StatusLabel::Pending)
        .expect("failed to read status")
        .expect("PENDING should be seeded");
    let order = insert_order(
        conn,
        &NewOrder {
            order_date: timestamp(),
            estimated_delivery_time: timestamp(),
            status_id: pending.id,
            price: Price::from_minor_units(900),
            address_id: address.id,
            user_id: user.id,
            restaurant_id: restaurant.id,
        },
    )
    .expect("failed to insert order");
    let comment = insert_comment(
        conn,
        &NewComment {
            body: "Best in town".into(),
            user_id: user.id,
            menu_item_id: item.id,
        },
    )
    .expect("failed to insert comment");

    Graph {
        state_id: state.id,
        city_id: city.id,
        address_id: address.id,
        user_id: user.id,
        restaurant_id: restaurant.id,
        category_id: category.id,
        menu_item_id: item.id,
        comment_id: comment.id,
        order_status_id: pending.id,
        order_id: order.id,
    }
}

#[test]
fn every_foreign_key_rejects_dangling_references() {
    let conn = migrated();
    let g = graph(&conn);
    let pending_id = order_status_by_label(&conn, StatusLabel::Pending)
        .expect("failed to read status")
        .expect("PENDING should be seeded")
        .id;
    let catalog_id = status_catalog_by_label(&conn, StatusLabel::Pending)
        .expect("failed to read catalog")
        .expect("PENDING should be seeded")
        .id;

    assert_foreign_key(
        insert_city(
            &conn,
            &NewCity {
                name: "Ghost".into(),
                zipcode: 1,
                address: "n/a".into(),
                state_id: MISSING,
                country: "US".into(),
            },
        ),
        "city.state_id",
    );
    assert_foreign_key(
        insert_address(
            &conn,
            &NewAddress {
                street_address: "nowhere".into(),
                city_id: MISSING,
                postal_code: 1,
            },
        ),
        "address.city_id",
    );
    assert_foreign_key(
        insert_restaurant(
            &conn,
            &NewRestaurant {
                name: "Ghost Diner".into(),
                street_address: "nowhere".into(),
                address_id: MISSING,
                city_id: g.city_id,
            },
        ),
        "restaurant.address_id",
    );
    assert_foreign_key(
        insert_restaurant(
            &conn,
            &NewRestaurant {
                name: "Ghost Diner".into(),
                street_address: "nowhere".into(),
                address_id: g.address_id,
                city_id: MISSING,
            },
        ),
        "restaurant.city_id",
    );
    assert_foreign_key(
        insert_user(
            &conn,
            &NewUser {
                name: "Nobody".into(),
                contact_phone: "0".into(),
                personal_email: "n@example".into(),
                email: "n@example".into(),
                password: "x".into(),
                address_id: MISSING,
            },
        ),
        "user.address_id",
    );
    assert_foreign_key(add_owner(&conn, MISSING, g.user_id), "restaurant_owner.restaurant_id");
    assert_foreign_key(add_owner(&conn, g.restaurant_id, MISSING), "restaurant_owner.owner_id");
    for (restaurant_id, category_id, what) in [
        (MISSING, g.category_id, "menu_item.restaurant_id"),
        (g.restaurant_id, MISSING, "menu_item.category_id"),
    ] {
        assert_foreign_key(
            insert_menu_item(
                &conn,
                &NewMenuItem {
                    restaurant_id,
                    category_id,
                    name: "Ghost dish".into(),
                    ingredients: "air".into(),
                    price: Price::ZERO,
                },
            ),
            what,
        );
    }

    let order = |status_id, address_id, user_id, restaurant_id| NewOrder {
        order_date: timestamp(),
        estimated_delivery_time: timestamp(),
        status_id,
        price: Price::ZERO,
        address_id,
        user_id,
        restaurant_id,
    };
    assert_foreign_key(
        insert_order(&conn, &order(MISSING, g.address_id, g.user_id, g.restaurant_id)),
        "orders.status_id",
    );
    assert_foreign_key(
        insert_order(&conn, &order(pending_id, MISSING, g.user_id, g.restaurant_id)),
        "orders.address_id",
    );
    assert_foreign_key(
        insert_order(&conn, &order(pending_id, g.address_id, MISSING, g.restaurant_id)),
        "orders.user_id",
    );
    assert_foreign_key(
        insert_order(&conn, &order(pending_id, g.address_id, g.user_id, MISSING)),
        "orders.restaurant_id",
    );

    assert_foreign_key(
        add_order_line(
            &conn,
            &NewOrderMenuItem {
                order_id: MISSING,
                menu_item_id: g.menu_item_id,
                quantity: 1,
            },
        ),
        "order_menu_items.order_id",
    );
    assert_foreign_key(
        add_order_line(
            &conn,
            &NewOrderMenuItem {
                order_id: g.order_id,
                menu_item_id: MISSING,
                quantity: 1,
            },
        ),
        "order_menu_items.menu_item_id",
    );

    assert_foreign_key(
        insert_comment(
            &conn,
            &NewComment {
                body: "?".into(),
                user_id: MISSING,
                menu_item_id: g.menu_item_id,
            },
        ),
        "comment.user_id",
    );
    assert_foreign_key(
        insert_comment(
            &conn,
            &NewComment {
                body: "?".into(),
                user_id: g.user_id,
                menu_item_id: MISSING,
            },
        ),
        "comment.menu_item_id",
    );

    assert_foreign_key(
        append_status_event(&conn, MISSING, catalog_id),
        "order_status_relation.order_id",
    );
    assert_foreign_key(
        append_status_event(&conn, g.order_id, MISSING),
        "order_status_relation.status_catalog_id",
    );
}

#[test]
fn deleting_a_referenced_state_is_restricted() {
    let conn = migrated();
    let g = graph(&conn);

    assert_foreign_key(delete_state(&conn, g.state_id), "state referenced by city");

    let city = get_city(&conn, g.city_id).expect("failed to read city");
    assert!(city.is_some(), "city must survive the rejected delete");
}

type Delete = fn(&Connection, i64) -> Result<(), StoreError>;

#[test]
fn deleting_any_referenced_row_is_restricted() {
    let conn = migrated();
    let g = graph(&conn);
    let owner = add_owner(&conn, g.restaurant_id, g.user_id).expect("failed to add owner");
    let line = add_order_line(
        &conn,
        &NewOrderMenuItem {
            order_id: g.order_id,
            menu_item_id: g.menu_item_id,
            quantity: 2,
        },
    )
    .expect("failed to add line");
    let catalog = status_catalog_by_label(&conn, StatusLabel::Pending)
        .expect("failed to read catalog")
        .expect("PENDING should be seeded");
    let event = append_status_event(&conn, g.order_id, catalog.id).expect("failed to append");

    // (parent, delete, parent id, dependent table, dependent id)
    let cases: [(&str, Delete, i64, &str, i64); 10] = [
        ("state", delete_state, g.state_id, "city", g.city_id),
        ("city", delete_city, g.city_id, "address", g.address_id),
        ("address", delete_address, g.address_id, "user", g.user_id),
        ("restaurant", delete_restaurant, g.restaurant_id, "restaurant_owner", owner.id),
        ("user", delete_user, g.user_id, "orders", g.order_id),
        ("category", delete_category, g.category_id, "menu_item", g.menu_item_id),
        ("menu_item", delete_menu_item, g.menu_item_id, "order_menu_items", line.id),
        ("order_status", delete_order_status, g.order_status_id, "orders", g.order_id),
        ("status_catalog", delete_status_catalog, catalog.id, "order_status_relation", event.id),
        ("orders", delete_order, g.order_id, "order_status_relation", event.id),
    ];

    for (parent, delete, id, dependent, dependent_id) in cases {
        assert_foreign_key(delete(&conn, id), &format!("{parent} referenced by {dependent}"));
        assert!(row_exists(&conn, parent, id), "{parent} must survive the rejected delete");
        assert!(
            row_exists(&conn, dependent, dependent_id),
            "{dependent} must survive the rejected delete of {parent}"
        );
    }
}

#[test]
fn deleting_an_order_with_history_is_restricted() {
    let conn = migrated();
    let g = graph(&conn);
    let catalog = status_catalog_by_label(&conn, StatusLabel::Pending)
        .expect("failed to read catalog")
        .expect("PENDING should be seeded");
    append_status_event(&conn, g.order_id, catalog.id).expect("failed to append event");

    assert_foreign_key(delete_order(&conn, g.order_id), "order referenced by history");
}

#[test]
fn status_history_rejects_updates() {
    let conn = migrated();
    let g = graph(&conn);
    let pending = status_catalog_by_label(&conn, StatusLabel::Pending)
        .expect("failed to read catalog")
        .expect("PENDING should be seeded");
    let delivered = status_catalog_by_label(&conn, StatusLabel::Delivered)
        .expect("failed to read catalog")
        .expect("DELIVERED should be seeded");
    let event = append_status_event(&conn, g.order_id, pending.id).expect("failed to append");

    let err = conn
        .execute(
            "UPDATE order_status_relation SET status_catalog_id = ?1 WHERE id = ?2",
            [delivered.id, event.id],
        )
        .map_err(StoreError::from)
        .expect_err("history rows must not be updated");
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Trigger));

    let history = status_history(&conn, g.order_id).expect("failed to read history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status.name, "PENDING");
}

#[test]
fn created_at_is_immutable() {
    let conn = migrated();
    let g = graph(&conn);

    for (table, id) in [
        ("address", g.address_id),
        ("restaurant", g.restaurant_id),
        ("\"user\"", g.user_id),
        ("menu_item", g.menu_item_id),
        ("comment", g.comment_id),
    ] {
        let err = conn
            .execute(
                &format!("UPDATE {table} SET created_at = '2000-01-01 00:00:00' WHERE id = ?1"),
                [id],
            )
            .map_err(StoreError::from)
            .expect_err("created_at must not change");
        assert_eq!(
            err.constraint_kind(),
            Some(ConstraintKind::Trigger),
            "{table}: unexpected error {err:?}"
        );
    }
}
