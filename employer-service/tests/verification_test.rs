mod common;

use chrono::Duration;
use common::TestApp;
use employer_service::{
    dtos::account::{
        ResendEmailCodeRequest, ResendMobileCodeRequest, VerifyEmailRequest, VerifyMobileRequest,
    },
    models::{Channel, Verification},
    services::{providers::MobileVerifier, ServiceError},
};
use std::sync::Arc;

const EMAIL: &str = "hr@acme.example";
const PHONE: &str = "+911234567890";

fn email_request(email: &str, otp: &str) -> VerifyEmailRequest {
    VerifyEmailRequest {
        email: email.to_string(),
        otp: otp.to_string(),
    }
}

fn mobile_request(phone: &str, otp: &str) -> VerifyMobileRequest {
    VerifyMobileRequest {
        phone_no: phone.to_string(),
        otp: otp.to_string(),
    }
}

#[tokio::test]
async fn email_then_mobile_reaches_full() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;

    let email_token = app.verify_email(EMAIL).await;
    let stored = app.account(&account.id).await;
    assert_eq!(stored.verification, Verification::Partial(Channel::Email));
    assert!(stored.email_challenge.is_none());
    assert_eq!(stored.session_token.as_deref(), Some(email_token.as_str()));

    let mobile_token = app.verify_mobile(PHONE).await;
    let stored = app.account(&account.id).await;
    assert_eq!(stored.verification, Verification::Full);
    assert_eq!(stored.session_token.as_deref(), Some(mobile_token.as_str()));
    assert_ne!(email_token, mobile_token);
}

#[tokio::test]
async fn mobile_then_email_reaches_full() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;

    app.verify_mobile(PHONE).await;
    assert_eq!(
        app.account(&account.id).await.verification,
        Verification::Partial(Channel::Mobile)
    );

    app.verify_email(EMAIL).await;
    assert!(app.account(&account.id).await.fully_verified());
}

#[tokio::test]
async fn issued_token_authenticates_the_account() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;

    let token = app.verify_email(EMAIL).await;
    let principal = app.state.accounts.authenticate(&token).await.unwrap();
    assert_eq!(principal.id, account.id);

    assert!(matches!(
        app.state.accounts.authenticate("not-a-token").await,
        Err(ServiceError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn email_code_is_case_insensitive_and_single_use() {
    let app = TestApp::new();
    app.register(EMAIL, PHONE).await;
    let code = app.email.last_code_for(EMAIL).unwrap();

    app.state
        .accounts
        .submit_email_code(email_request("HR@ACME.EXAMPLE", &code.to_uppercase()))
        .await
        .unwrap();

    let replay = app
        .state
        .accounts
        .submit_email_code(email_request(EMAIL, &code))
        .await;
    assert!(matches!(
        replay,
        Err(ServiceError::InvalidOrExpiredCode(Channel::Email))
    ));
}

#[tokio::test]
async fn wrong_email_code_changes_nothing() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;
    let before = app.account(&account.id).await;

    let err = app
        .state
        .accounts
        .submit_email_code(email_request(EMAIL, "zzzzzz"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Email verification OTP is invalid or has expired."
    );

    let after = app.account(&account.id).await;
    assert_eq!(after.verification, Verification::Unverified);
    assert_eq!(after.version, before.version);
    assert_eq!(after.email_challenge, before.email_challenge);
}

#[tokio::test]
async fn unknown_email_gets_the_same_answer_as_a_wrong_code() {
    let app = TestApp::new();

    let err = app
        .state
        .accounts
        .submit_email_code(email_request("nobody@acme.example", "a1b2c3"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidOrExpiredCode(Channel::Email)
    ));
}

#[tokio::test]
async fn email_code_expires_after_ten_minutes() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;
    let code = app.email.last_code_for(EMAIL).unwrap();

    app.clock.advance(Duration::minutes(10));

    let err = app
        .state
        .accounts
        .submit_email_code(email_request(EMAIL, &code))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidOrExpiredCode(Channel::Email)
    ));
    assert!(!app.account(&account.id).await.email_verified());
}

#[tokio::test]
async fn email_code_is_accepted_just_before_expiry() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;
    let code = app.email.last_code_for(EMAIL).unwrap();

    app.clock
        .advance(Duration::minutes(10) - Duration::seconds(1));

    app.state
        .accounts
        .submit_email_code(email_request(EMAIL, &code))
        .await
        .unwrap();
    assert!(app.account(&account.id).await.email_verified());
}

#[tokio::test]
async fn resend_replaces_the_email_code() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;
    let first = app.email.last_code_for(EMAIL).unwrap();

    app.clock.advance(Duration::minutes(9));
    // Codes are random, so a repeat is possible
    let mut second = first.clone();
    while second == first {
        app.state
            .accounts
            .resend_email_code(ResendEmailCodeRequest {
                email: EMAIL.to_string(),
            })
            .await
            .unwrap();
        second = app.email.last_code_for(EMAIL).unwrap();
    }

    let stale = app
        .state
        .accounts
        .submit_email_code(email_request(EMAIL, &first))
        .await;
    assert!(matches!(
        stale,
        Err(ServiceError::InvalidOrExpiredCode(Channel::Email))
    ));

    // The new code carries a fresh ten minute window
    app.clock.advance(Duration::minutes(5));
    app.state
        .accounts
        .submit_email_code(email_request(EMAIL, &second))
        .await
        .unwrap();
    assert!(app.account(&account.id).await.email_verified());
}

#[tokio::test]
async fn resend_does_not_reveal_accounts() {
    let app = TestApp::new();

    app.state
        .accounts
        .resend_email_code(ResendEmailCodeRequest {
            email: "nobody@acme.example".to_string(),
        })
        .await
        .unwrap();
    app.state
        .accounts
        .resend_mobile_code(ResendMobileCodeRequest {
            phone_no: "+919999999999".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(app.email.send_count(), 0);
    assert_eq!(app.mobile.start_count(), 0);
}

#[tokio::test]
async fn resend_is_a_no_op_for_verified_channels() {
    let app = TestApp::new();
    app.fully_verified(EMAIL, PHONE).await;
    let emails = app.email.send_count();
    let starts = app.mobile.start_count();

    app.state
        .accounts
        .resend_email_code(ResendEmailCodeRequest {
            email: EMAIL.to_string(),
        })
        .await
        .unwrap();
    app.state
        .accounts
        .resend_mobile_code(ResendMobileCodeRequest {
            phone_no: PHONE.to_string(),
        })
        .await
        .unwrap();

    assert_eq!(app.email.send_count(), emails);
    assert_eq!(app.mobile.start_count(), starts);
}

#[tokio::test]
async fn resend_mobile_starts_a_new_challenge() {
    let app = TestApp::new();
    app.register(EMAIL, PHONE).await;

    app.state
        .accounts
        .resend_mobile_code(ResendMobileCodeRequest {
            phone_no: PHONE.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(app.mobile.start_count(), 2);

    app.verify_mobile(PHONE).await;
}

#[tokio::test]
async fn rejected_mobile_code_changes_nothing() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;
    let live = app.mobile.code_for(PHONE).unwrap();
    let wrong = if live == "000000" { "111111" } else { "000000" };

    let err = app
        .state
        .accounts
        .submit_mobile_code(mobile_request(PHONE, wrong))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Mobile verification OTP is invalid or has expired."
    );
    assert_eq!(
        app.account(&account.id).await.verification,
        Verification::Unverified
    );
}

#[tokio::test]
async fn mobile_provider_outage_is_reported_as_invalid_code() {
    let app = TestApp::new();
    let account = app.register(EMAIL, PHONE).await;
    let live = app.mobile.code_for(PHONE).unwrap();

    app.mobile.set_failing(true);
    let err = app
        .state
        .accounts
        .submit_mobile_code(mobile_request(PHONE, &live))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidOrExpiredCode(Channel::Mobile)
    ));
    assert!(!app.account(&account.id).await.mobile_verified());
}

#[tokio::test]
async fn approved_code_for_unknown_phone_is_not_found() {
    let app = TestApp::new();
    let stranger = "+919999999999";
    app.mobile.start_verification(stranger).await.unwrap();
    let live = app.mobile.code_for(stranger).unwrap();

    let err = app
        .state
        .accounts
        .submit_mobile_code(mobile_request(stranger, &live))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AccountNotFound));
    assert_eq!(err.to_string(), "User not found.");
}

#[tokio::test]
async fn repeated_verification_keeps_full_and_reissues_token() {
    let app = TestApp::new();
    let (account, token) = app.fully_verified(EMAIL, PHONE).await;

    app.mobile.start_verification(PHONE).await.unwrap();
    let reissued = app.verify_mobile(PHONE).await;

    assert_ne!(reissued, token);
    let stored = app.account(&account.id).await;
    assert_eq!(stored.verification, Verification::Full);
    assert_eq!(stored.session_token.as_deref(), Some(reissued.as_str()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_email_and_mobile_confirmation_reaches_full() {
    for _ in 0..20 {
        let app = Arc::new(TestApp::new());
        let account = app.register(EMAIL, PHONE).await;
        let email_code = app.email.last_code_for(EMAIL).unwrap();
        let mobile_code = app.mobile.code_for(PHONE).unwrap();

        let email_task = {
            let app = app.clone();
            tokio::spawn(async move {
                app.state
                    .accounts
                    .submit_email_code(email_request(EMAIL, &email_code))
                    .await
            })
        };
        let mobile_task = {
            let app = app.clone();
            tokio::spawn(async move {
                app.state
                    .accounts
                    .submit_mobile_code(mobile_request(PHONE, &mobile_code))
                    .await
            })
        };

        email_task.await.unwrap().unwrap();
        mobile_task.await.unwrap().unwrap();

        let stored = app.account(&account.id).await;
        assert_eq!(stored.verification, Verification::Full);
        assert!(stored.email_challenge.is_none());
        assert!(stored.session_token.is_some());
    }
}
