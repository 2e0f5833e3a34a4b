//! End-to-end signing and broadcast against a mock node

mod common;

use common::{signer, MockChain, CHAIN_ID};
use cosmlink::client::{find_attribute, AccountSequence};
use cosmlink::codec::msgs::{MsgSend, MsgVote, VoteOption};
use cosmlink::codec::CodecError;
use cosmlink::{
    assert_success, BroadcastOptions, ClientError, Coin, Fee, Secp256k1Signer, SignMode,
    SignerOptions, SigningClient, StargateClient, TypedMessage,
};
use std::sync::Arc;
use std::time::Duration;

const RECIPIENT: &str = "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";

fn fast_broadcast() -> BroadcastOptions {
    BroadcastOptions {
        timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
        ..BroadcastOptions::default()
    }
}

fn options(sign_mode: SignMode) -> SignerOptions {
    SignerOptions {
        sign_mode,
        broadcast: fast_broadcast(),
        ..SignerOptions::default()
    }
}

fn fee() -> Fee {
    Fee::new(vec![Coin::new("ucosm", "5000").unwrap()], 200_000)
}

fn send_msg(from: &str, amount: &str) -> TypedMessage {
    TypedMessage::new(MsgSend::new(
        from,
        RECIPIENT,
        vec![Coin::new("ucosm", amount).unwrap()],
    ))
}

async fn setup(sign_mode: SignMode) -> (MockChain, SigningClient<Secp256k1Signer>, String) {
    let chain = MockChain::start().await;
    let signer = signer();
    let address = signer.address().to_string();
    chain.add_account(&address, 7, 5);

    let client = SigningClient::connect_with_signer(chain.url.as_str(), signer, options(sign_mode))
        .await
        .unwrap();
    (chain, client, address)
}

#[tokio::test]
async fn test_direct_send_is_confirmed() {
    let (chain, client, address) = setup(SignMode::Direct).await;

    let result = client
        .send_tokens(&address, RECIPIENT, vec![Coin::new("ucosm", "1234").unwrap()], fee(), "")
        .await
        .unwrap();
    assert_success(&result).unwrap();

    assert_eq!(result.hash.len(), 64);
    assert!(result.height > 1);
    assert_eq!(result.deliver_tx.as_ref().unwrap().gas_used, 61_234);
    assert_eq!(
        find_attribute(&result, "message", "action").as_deref(),
        Some("/cosmos.bank.v1beta1.MsgSend")
    );
    assert_eq!(
        find_attribute(&result, "tx", "acc_seq"),
        Some(format!("{address}/5"))
    );
    assert_eq!(chain.sequence_of(&address), 6);
    assert_eq!(chain.calls_to("broadcast_tx_sync"), 1);
}

#[tokio::test]
async fn test_sync_broadcast_polls_until_included() {
    let (chain, client, address) = setup(SignMode::Direct).await;
    chain.hide_txs_for(3);

    let result = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "10")], fee(), "poll me")
        .await
        .unwrap();
    assert!(result.is_success());
    assert!(result.deliver_tx.is_some());
    assert_eq!(chain.calls_to("tx"), 4);
}

#[tokio::test]
async fn test_legacy_commit_broadcast() {
    let chain = MockChain::start().await;
    let signer = signer();
    let address = signer.address().to_string();
    chain.add_account(&address, 7, 0);

    let mut options = options(SignMode::Direct);
    options.broadcast.use_legacy_broadcast_tx_commit = true;
    let client = SigningClient::connect_with_signer(chain.url.as_str(), signer, options)
        .await
        .unwrap();

    let result = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "1")], fee(), "")
        .await
        .unwrap();
    assert_success(&result).unwrap();
    assert_eq!(chain.calls_to("broadcast_tx_commit"), 1);
    assert_eq!(chain.calls_to("tx"), 0);
    assert!(result.height > 0);
}

#[tokio::test]
async fn test_async_broadcast_does_not_wait() {
    let chain = MockChain::start().await;
    let signer = signer();
    let address = signer.address().to_string();
    chain.add_account(&address, 7, 0);

    let mut options = options(SignMode::Direct);
    options.broadcast.check_tx = false;
    options.broadcast.deliver_tx = false;
    let client = SigningClient::connect_with_signer(chain.url.as_str(), signer, options)
        .await
        .unwrap();

    let result = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "1")], fee(), "")
        .await
        .unwrap();
    assert!(result.deliver_tx.is_none());
    assert_eq!(result.height, 0);
    assert_eq!(chain.calls_to("broadcast_tx_async"), 1);
}

#[tokio::test]
async fn test_deliver_failure_surfaces_code_and_log() {
    let (chain, client, address) = setup(SignMode::Direct).await;
    chain.fail_deliver(5, "insufficient funds: 10ucosm is smaller than 1000000ucosm");

    let result = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "1000000")], fee(), "")
        .await
        .unwrap();
    let err = assert_success(&result).unwrap_err();
    match err {
        ClientError::ChainExecution { code, log } => {
            assert_eq!(code, 5);
            assert_eq!(log, "insufficient funds: 10ucosm is smaller than 1000000ucosm");
        }
        other => panic!("unexpected error {other:?}"),
    }

    // the sequence is consumed by a failed delivery
    assert_eq!(chain.sequence_of(&address), 6);
    assert_eq!(
        client.sequences().cached(&address).await,
        Some(AccountSequence {
            account_number: 7,
            sequence: 6
        })
    );
}

#[tokio::test]
async fn test_amino_signed_vote() {
    let (chain, client, address) = setup(SignMode::Amino).await;

    let vote = TypedMessage::new(MsgVote::new(4, address.clone(), VoteOption::Yes));
    let result = client
        .sign_and_broadcast(&address, vec![vote], fee(), "<amino & co>")
        .await
        .unwrap();
    assert_success(&result).unwrap();
    assert_eq!(
        find_attribute(&result, "message", "action").as_deref(),
        Some("/cosmos.gov.v1beta1.MsgVote")
    );
    assert_eq!(chain.accepted_sequences(), vec![5]);
}

#[tokio::test]
async fn test_sequence_increments_between_transactions() {
    let (chain, client, address) = setup(SignMode::Direct).await;

    for amount in ["1", "2", "3"] {
        let result = client
            .sign_and_broadcast(&address, vec![send_msg(&address, amount)], fee(), "")
            .await
            .unwrap();
        assert_success(&result).unwrap();
    }

    assert_eq!(chain.accepted_sequences(), vec![5, 6, 7]);
    // only the first submission needs the account query
    assert_eq!(chain.calls_to("abci_query"), 1);
}

#[tokio::test]
async fn test_concurrent_submissions_get_consecutive_sequences() {
    let (chain, client, address) = setup(SignMode::Direct).await;
    let client = Arc::new(client);

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let client = client.clone();
            let address = address.clone();
            tokio::spawn(async move {
                let msg = send_msg(&address, &(i + 1).to_string());
                client
                    .sign_and_broadcast(&address, vec![msg], fee(), &format!("tx {i}"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_success(&result).unwrap();
    }

    assert_eq!(chain.accepted_sequences(), vec![5, 6, 7, 8, 9]);
    assert_eq!(chain.sequence_of(&address), 10);
}

#[tokio::test]
async fn test_sequence_mismatch_resets_cache() {
    let (chain, client, address) = setup(SignMode::Direct).await;

    let first = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "1")], fee(), "")
        .await
        .unwrap();
    assert_success(&first).unwrap();

    // another wallet spends from the same account
    chain.bump_sequence(&address);

    let stale = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "2")], fee(), "")
        .await
        .unwrap();
    let err = assert_success(&stale).unwrap_err();
    assert!(matches!(err, ClientError::ChainExecution { code: 32, .. }));
    assert!(client.sequences().cached(&address).await.is_none());

    let retried = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "2")], fee(), "")
        .await
        .unwrap();
    assert_success(&retried).unwrap();
    assert_eq!(chain.accepted_sequences(), vec![5, 7]);
}

#[tokio::test]
async fn test_unconfirmed_accepted_tx_advances_sequence() {
    let chain = MockChain::start().await;
    let signer = signer();
    let address = signer.address().to_string();
    chain.add_account(&address, 7, 5);
    chain.hide_txs_for(100_000);

    let mut options = options(SignMode::Direct);
    options.broadcast.timeout = Duration::from_millis(100);
    let client = SigningClient::connect_with_signer(chain.url.as_str(), signer, options)
        .await
        .unwrap();

    let err = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "1")], fee(), "")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "{err:?}");
    assert_eq!(chain.accepted_sequences(), vec![5]);
    assert_eq!(
        client.sequences().cached(&address).await,
        Some(AccountSequence {
            account_number: 7,
            sequence: 6
        })
    );

    chain.hide_txs_for(0);
    let next = client
        .sign_and_broadcast(&address, vec![send_msg(&address, "2")], fee(), "")
        .await
        .unwrap();
    assert_success(&next).unwrap();
    assert_eq!(chain.accepted_sequences(), vec![5, 6]);
    assert_eq!(chain.calls_to("abci_query"), 1);
}

#[tokio::test]
async fn test_unregistered_message_is_rejected_before_broadcast() {
    let (chain, client, address) = setup(SignMode::Direct).await;

    let msg = TypedMessage::from_parts("/chain.custom.v1.MsgPing", Box::new("ping".to_string()));
    let err = client
        .sign_and_broadcast(&address, vec![msg], fee(), "")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Codec(CodecError::UnknownTypeUrl(_))));
    assert_eq!(chain.calls_to("broadcast_tx_sync"), 0);
}

#[tokio::test]
async fn test_empty_message_list() {
    let (_chain, client, address) = setup(SignMode::Direct).await;
    let err = client
        .sign_and_broadcast(&address, vec![], fee(), "")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::EmptyMessageList));
}

#[tokio::test]
async fn test_connect_resolves_chain_id_once() {
    let (chain, client, _address) = setup(SignMode::Direct).await;

    assert_eq!(client.connect().await.unwrap(), CHAIN_ID);
    assert_eq!(client.connect().await.unwrap(), CHAIN_ID);
    assert_eq!(chain.calls_to("status"), 1);
}

#[tokio::test]
async fn test_queries() {
    let chain = MockChain::start().await;
    let address = signer().address().to_string();
    chain.add_account(&address, 7, 5);
    chain.set_balance(&address, Coin::new("ucosm", "987654321").unwrap());

    let client = StargateClient::connect(chain.url.as_str()).await.unwrap();
    assert_eq!(client.chain_id().await.unwrap(), CHAIN_ID);
    assert_eq!(client.get_height().await.unwrap(), 1);

    let account = client.query_account(&address).await.unwrap();
    assert_eq!((account.account_number, account.sequence), (7, 5));

    let balance = client.get_balance(&address, "ucosm").await.unwrap();
    assert_eq!(balance.amount, "987654321");
    let none = client.get_balance(&address, "uatom").await.unwrap();
    assert_eq!(none, Coin::new("uatom", "0").unwrap());

    let err = client.query_account(RECIPIENT).await.unwrap_err();
    assert!(matches!(err, ClientError::AccountNotFound(ref a) if a == RECIPIENT));
}

#[tokio::test]
async fn test_signer_without_account() {
    let (_chain, client, _address) = setup(SignMode::Direct).await;

    let err = client
        .signer_context(RECIPIENT, 1, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Signer(_)));
}
