//! Authentication and wallet status integration tests for inapp-wallet
//!
//! Tests strategy dispatch through the registry and status resolution.

use inapp_wallet::{
    AuthArgs, Client, ErrorKind, MockBridge, MockChainRpc, OauthOptions, PreAuthArgs, Procedure,
    SessionRegistry, StaticConnector, Strategy, UserWalletStatus, WalletError, WalletStatus,
};
use serde_json::{json, Value};
use std::sync::Arc;

const ADDRESS: &str = "0x742d35cc6634c0532925a3b844bc9e7595f0ab3d";

fn setup(bridge: MockBridge) -> (Arc<MockBridge>, SessionRegistry, Arc<Client>) {
    let bridge = Arc::new(bridge);
    let registry = SessionRegistry::new(Arc::new(StaticConnector::new(bridge.clone())))
        .with_chain_rpc(Arc::new(MockChainRpc::default()));
    (bridge, registry, Client::new("client-1"))
}

fn status_response(status: &str) -> Value {
    json!({
        "status": status,
        "user": {
            "authDetails": { "email": "user@example.com", "userWalletId": "wallet-user-1" },
            "walletAddress": ADDRESS,
        },
    })
}

// ==================== Pre-authentication Tests ====================

#[tokio::test]
async fn test_pre_authenticate_email_sends_otp() {
    let bridge = MockBridge::new();
    bridge.set_response(Procedure::SendEmailLoginOtp, json!({ "isNewUser": true }));
    let (bridge, registry, client) = setup(bridge);

    let result = registry
        .pre_authenticate(&client, &PreAuthArgs::email("user@example.com"))
        .await
        .unwrap();

    assert_eq!(result["isNewUser"], true);
    assert_eq!(
        bridge.calls(),
        vec![(Procedure::SendEmailLoginOtp, json!({ "email": "user@example.com" }))]
    );
}

#[tokio::test]
async fn test_pre_authenticate_apple_is_rejected_locally() {
    let (bridge, registry, client) = setup(MockBridge::new());

    let err = registry
        .pre_authenticate(&client, &PreAuthArgs { strategy: Strategy::Apple, email: None })
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::NoPreAuthentication(ref s) if s == "apple"));
    assert_eq!(err.kind(), ErrorKind::CallerMisuse);
    assert_eq!(bridge.call_count(), 0);
}

// ==================== Authentication Tests ====================

#[tokio::test]
async fn test_authenticate_email_passes_result_through() {
    let login = json!({ "user": { "status": "Logged In, Wallet Initialized", "walletAddress": ADDRESS } });
    let bridge = MockBridge::new();
    bridge.set_response(Procedure::VerifyEmailLoginOtp, login.clone());
    let (bridge, registry, client) = setup(bridge);

    let result = registry
        .authenticate(
            &client,
            &AuthArgs::Email {
                email: "user@example.com".to_string(),
                verification_code: "424242".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(result.into_inner(), login);
    assert_eq!(
        bridge.last_params(Procedure::VerifyEmailLoginOtp).unwrap(),
        json!({ "email": "user@example.com", "otp": "424242" })
    );
}

#[tokio::test]
async fn test_authenticate_dispatches_each_strategy() {
    let bridge = MockBridge::new();
    for procedure in [
        Procedure::VerifyEmailLoginOtp,
        Procedure::LoginWithOauth,
        Procedure::LoginWithCustomJwt,
        Procedure::LoginWithCustomAuthEndpoint,
        Procedure::LoginWithEmailOtp,
        Procedure::LoginWithModal,
    ] {
        bridge.set_response(procedure, json!({ "user": {} }));
    }
    let (bridge, registry, client) = setup(bridge);

    let cases = vec![
        (
            AuthArgs::Email {
                email: "a@b.c".to_string(),
                verification_code: "1".to_string(),
            },
            Procedure::VerifyEmailLoginOtp,
        ),
        (AuthArgs::Apple(OauthOptions::default()), Procedure::LoginWithOauth),
        (AuthArgs::Facebook(OauthOptions::default()), Procedure::LoginWithOauth),
        (AuthArgs::Google(OauthOptions::default()), Procedure::LoginWithOauth),
        (
            AuthArgs::Jwt {
                jwt: "jwt".to_string(),
                encryption_key: "k".to_string(),
            },
            Procedure::LoginWithCustomJwt,
        ),
        (
            AuthArgs::AuthEndpoint {
                payload: "p".to_string(),
                encryption_key: "k".to_string(),
            },
            Procedure::LoginWithCustomAuthEndpoint,
        ),
        (
            AuthArgs::IframeEmailVerification {
                email: "a@b.c".to_string(),
            },
            Procedure::LoginWithEmailOtp,
        ),
        (AuthArgs::Iframe, Procedure::LoginWithModal),
    ];

    for (args, expected) in &cases {
        registry.authenticate(&client, args).await.unwrap();
        let (procedure, _) = bridge.calls().pop().unwrap();
        assert_eq!(procedure, *expected, "strategy {}", args.strategy());
    }
    assert_eq!(bridge.call_count(), cases.len());
}

#[tokio::test]
async fn test_authenticate_google_provider_payload() {
    let bridge = MockBridge::new();
    bridge.set_response(Procedure::LoginWithOauth, json!({ "user": {} }));
    let (bridge, registry, client) = setup(bridge);

    registry
        .authenticate(
            &client,
            &AuthArgs::Google(OauthOptions {
                opened_window: Some("popup".to_string()),
                close_opened_window: false,
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        bridge.last_params(Procedure::LoginWithOauth).unwrap(),
        json!({ "oauthProvider": "Google", "closeOpenedWindow": false, "openedWindow": "popup" })
    );
}

#[tokio::test]
async fn test_authenticate_remote_error_propagates_unchanged() {
    let bridge = MockBridge::new();
    bridge.set_error(Procedure::VerifyEmailLoginOtp, "Invalid OTP");
    let (_bridge, registry, client) = setup(bridge);

    let err = registry
        .authenticate(
            &client,
            &AuthArgs::Email {
                email: "a@b.c".to_string(),
                verification_code: "000000".to_string(),
            },
        )
        .await
        .unwrap_err();

    match err {
        WalletError::Remote { procedure, message } => {
            assert_eq!(procedure, Procedure::VerifyEmailLoginOtp);
            assert_eq!(message, "Invalid OTP");
        }
        other => panic!("Expected remote error, got {:?}", other),
    }
}

#[test]
fn test_unknown_strategy_tag_rejected() {
    let err = "metamask".parse::<Strategy>().unwrap_err();
    assert!(matches!(err, WalletError::UnknownStrategy(_)));
    assert!(err.is_caller_misuse());
}

// ==================== Wallet Status Tests ====================

#[tokio::test]
async fn test_status_logged_out() {
    let bridge = MockBridge::new();
    bridge.set_response(Procedure::GetUserStatus, json!({ "status": "Logged Out" }));
    let (bridge, registry, client) = setup(bridge);

    let status = registry.get_user_wallet_status(&client).await.unwrap();
    assert!(matches!(status, WalletStatus::LoggedOut));
    assert_eq!(bridge.calls(), vec![(Procedure::GetUserStatus, Value::Null)]);
}

#[tokio::test]
async fn test_status_new_device_reported_as_uninitialized() {
    let bridge = MockBridge::new();
    bridge.set_response(Procedure::GetUserStatus, status_response("Logged In, New Device"));
    let (_bridge, registry, client) = setup(bridge);

    let status = registry.get_user_wallet_status(&client).await.unwrap();
    assert_eq!(status.tag(), UserWalletStatus::LoggedInWalletUninitialized);
    match status {
        WalletStatus::LoggedInWalletUninitialized { user } => {
            assert_eq!(user.auth_details.email.as_deref(), Some("user@example.com"));
            assert_eq!(user.wallet_address.unwrap().to_hex(), ADDRESS);
        }
        other => panic!("Expected uninitialized status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_uninitialized() {
    let bridge = MockBridge::new();
    bridge.set_response(
        Procedure::GetUserStatus,
        json!({
            "status": "Logged In, Wallet Uninitialized",
            "user": { "authDetails": { "email": "user@example.com" } },
        }),
    );
    let (_bridge, registry, client) = setup(bridge);

    let status = registry.get_user_wallet_status(&client).await.unwrap();
    assert!(status.authenticated_user().is_none());
    assert!(matches!(
        status,
        WalletStatus::LoggedInWalletUninitialized { ref user } if user.wallet_address.is_none()
    ));
}

#[tokio::test]
async fn test_status_initialized_carries_session() {
    let (_bridge, registry, client) = setup(MockBridge::logged_in(ADDRESS));

    let session = registry.get_or_create(&client).await.unwrap();
    let status = registry.get_user_wallet_status(&client).await.unwrap();
    let user = status.authenticated_user().unwrap();

    assert_eq!(user.wallet_address.to_hex(), ADDRESS);
    assert_eq!(user.auth_details.user_wallet_id.as_deref(), Some("wallet-user-1"));
    assert!(Arc::ptr_eq(&user.wallet, &session));
}

#[tokio::test]
async fn test_status_remote_failure_not_retried() {
    let bridge = MockBridge::new();
    bridge.set_error(Procedure::GetUserStatus, "network error");
    let (bridge, registry, client) = setup(bridge);

    let err = registry.get_user_wallet_status(&client).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteProcedure);
    assert_eq!(bridge.call_count(), 1);
}

// ==================== Authenticated User Tests ====================

#[tokio::test]
async fn test_get_authenticated_user_and_email() {
    let (_bridge, registry, client) = setup(MockBridge::logged_in(ADDRESS));

    let user = registry.get_authenticated_user(&client).await.unwrap().unwrap();
    assert_eq!(user.wallet_address.to_hex(), ADDRESS);
    assert_eq!(
        registry.get_user_email(&client).await.unwrap().as_deref(),
        Some("user@example.com")
    );
}

#[tokio::test]
async fn test_get_authenticated_user_none_when_not_initialized() {
    let bridge = MockBridge::new();
    bridge.set_response(Procedure::GetUserStatus, status_response("Logged In, New Device"));
    let (_bridge, registry, client) = setup(bridge);

    assert!(registry.get_authenticated_user(&client).await.unwrap().is_none());
    assert!(registry.get_user_email(&client).await.unwrap().is_none());
}
