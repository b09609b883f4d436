//! Circulation consistency under concurrent load

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use bibliotheca_server::{
    config::AppConfig,
    models::{BorrowOutcome, LoanFilter, NewBook, NewUser, ReturnOutcome, UserRole},
    repository::{MemoryStore, SharedStore, Store},
    services::Services,
};

async fn add_reader(store: &MemoryStore, n: usize) -> i32 {
    store
        .insert_user(&NewUser {
            first_name: "Reader".to_string(),
            last_name: n.to_string(),
            email: format!("reader{}@library.test", n),
            mobile: String::new(),
            password_hash: String::new(),
            blocked: false,
            active: true,
            role: UserRole::User,
            created_on: Utc::now(),
        })
        .await
        .unwrap()
        .id
}

async fn add_book(store: &MemoryStore, title: &str) -> i32 {
    let category = match store.find_category("fiction", "novels").await.unwrap() {
        Some(category) => category,
        None => store.insert_category("fiction", "novels").await.unwrap(),
    };
    store
        .insert_book(&NewBook {
            title: title.to_string(),
            author: "Anonymous".to_string(),
            price: Decimal::new(1000, 2),
            category_id: category.id,
        })
        .await
        .unwrap()
        .id
}

fn services(store: Arc<MemoryStore>) -> Services {
    let shared: SharedStore = store;
    Services::new(shared, &AppConfig::default())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_yield_one_loan() {
    let store = Arc::new(MemoryStore::new());
    let book_id = add_book(&store, "Middlemarch").await;
    let mut readers = Vec::new();
    for n in 0..16 {
        readers.push(add_reader(&store, n).await);
    }
    let services = services(store.clone());

    let handles: Vec<_> = readers
        .into_iter()
        .map(|user_id| {
            let loans = services.loans.clone();
            tokio::spawn(async move { loans.borrow(user_id, book_id).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            BorrowOutcome::Borrowed(_) => winners += 1,
            BorrowOutcome::AlreadyOrdered => {}
        }
    }

    assert_eq!(winners, 1);
    let open = store.list_loans(LoanFilter::open()).await.unwrap();
    assert_eq!(open.len(), 1);
    assert!(!services.inventory.is_available(book_id).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flag_matches_open_loans_after_mixed_traffic() {
    let store = Arc::new(MemoryStore::new());
    let mut books = Vec::new();
    for n in 0..4 {
        books.push(add_book(&store, &format!("Volume {}", n)).await);
    }
    let mut readers = Vec::new();
    for n in 0..6 {
        readers.push(add_reader(&store, n).await);
    }
    let services = services(store.clone());

    let mut handles = Vec::new();
    for round in 0..3 {
        for (i, &user_id) in readers.iter().enumerate() {
            let book_id = books[(i + round) % books.len()];
            let loans = services.loans.clone();
            handles.push(tokio::spawn(async move {
                loans.borrow(user_id, book_id).await.unwrap();
                loans.give_back(user_id, book_id).await.unwrap();
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let open = store.list_loans(LoanFilter::open()).await.unwrap();
    for book_id in books {
        let open_for_book = open.iter().filter(|loan| loan.book_id == book_id).count();
        assert!(open_for_book <= 1);
        let available = services.inventory.is_available(book_id).await.unwrap();
        assert_eq!(available, open_for_book == 0, "book {}", book_id);
    }
}

#[tokio::test]
async fn test_return_then_reborrow_by_other_reader() {
    let store = Arc::new(MemoryStore::new());
    let book_id = add_book(&store, "Emma").await;
    let ann = add_reader(&store, 1).await;
    let bob = add_reader(&store, 2).await;
    let services = services(store.clone());

    assert!(services.loans.borrow(ann, book_id).await.unwrap().is_success());
    assert_eq!(
        services.loans.borrow(bob, book_id).await.unwrap(),
        BorrowOutcome::AlreadyOrdered
    );
    assert!(matches!(
        services.loans.give_back(ann, book_id).await.unwrap(),
        ReturnOutcome::Returned(_)
    ));
    assert!(services.loans.borrow(bob, book_id).await.unwrap().is_success());

    let history = services.loans.all_loans().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.iter().filter(|loan| !loan.returned).count(), 1);
}

#[tokio::test]
async fn test_overdue_fine_accrues_from_borrow_date() {
    let store = Arc::new(MemoryStore::new());
    let first = add_book(&store, "Emma").await;
    let second = add_book(&store, "Persuasion").await;
    let ann = add_reader(&store, 1).await;
    let services = services(store.clone());

    let now = Utc::now();
    services
        .loans
        .borrow_at(ann, first, now - Duration::days(15))
        .await
        .unwrap();
    services
        .loans
        .borrow_at(ann, second, now - Duration::days(11))
        .await
        .unwrap();

    assert_eq!(services.fines.compute_fine_at(ann, now).await.unwrap(), 12);

    services.loans.give_back(ann, first).await.unwrap();
    assert_eq!(services.fines.compute_fine_at(ann, now).await.unwrap(), 2);

    let everyone = services.fines.users_with_fines_at(now).await.unwrap();
    assert_eq!(everyone.len(), 1);
    assert_eq!(everyone[0].fine, 2);
}
