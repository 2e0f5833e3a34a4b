//! Transaction builder: unsigned transaction, sign document, raw bytes

use crate::{ClientError, Result};
use cosmlink_codec::{Any, Registry, TypedMessage};
use cosmlink_types::proto::{AuthInfoProto, ModeInfoProto, SignerInfoProto, TxBodyProto};
use cosmlink_types::{
    Fee, SignDoc, SignDocProto, SignMode, Signature, SignerContext, StdSignDoc, TxRaw, UnsignedTx,
};
use prost::Message;
use std::sync::Arc;

/// Signed transaction ready for broadcast
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTx {
    pub raw_tx: TxRaw,
    /// Encoded `TxRaw`
    pub tx_bytes: Vec<u8>,
    /// Uppercase hex hash of `tx_bytes`
    pub tx_hash: String,
}

impl From<TxRaw> for SignedTx {
    fn from(raw_tx: TxRaw) -> Self {
        let tx_bytes = raw_tx.to_bytes();
        let tx_hash = cosmlink_types::proto::tx_hash(&tx_bytes);
        Self {
            raw_tx,
            tx_bytes,
            tx_hash,
        }
    }
}

/// Turns messages into signed transaction bytes
///
/// Every message must be registered; the builder never looks inside the
/// message values, it only dispatches through the registry.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    registry: Arc<Registry>,
}

impl TxBuilder {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn build_unsigned(
        &self,
        messages: Vec<TypedMessage>,
        fee: Fee,
        memo: impl Into<String>,
        signer: SignerContext,
    ) -> Result<UnsignedTx> {
        if messages.is_empty() {
            return Err(ClientError::EmptyMessageList);
        }
        for msg in &messages {
            self.registry.get(&msg.type_url)?;
        }

        Ok(UnsignedTx {
            messages,
            fee,
            memo: memo.into(),
            timeout_height: 0,
            signer,
        })
    }

    pub fn encode_body(&self, tx: &UnsignedTx) -> Result<Vec<u8>> {
        let messages = tx
            .messages
            .iter()
            .map(|msg| self.registry.encode_any(msg))
            .collect::<std::result::Result<Vec<Any>, _>>()?;

        let body = TxBodyProto {
            messages,
            memo: tx.memo.clone(),
            timeout_height: tx.timeout_height,
            extension_options: vec![],
            non_critical_extension_options: vec![],
        };
        Ok(body.encode_to_vec())
    }

    /// Auth info with a single signer using `mode`
    pub fn encode_auth_info(&self, tx: &UnsignedTx, mode: SignMode) -> Vec<u8> {
        let signer_info = SignerInfoProto {
            public_key: Some(tx.signer.pub_key.to_any()),
            mode_info: Some(ModeInfoProto::single(mode.to_proto())),
            sequence: tx.signer.sequence,
        };
        let auth_info = AuthInfoProto {
            signer_infos: vec![signer_info],
            fee: Some(tx.fee.to_proto()),
        };
        auth_info.encode_to_vec()
    }

    pub fn compute_sign_bytes(&self, tx: &UnsignedTx, mode: SignMode) -> Result<SignDoc> {
        match mode {
            SignMode::Direct => Ok(SignDoc::Direct(SignDocProto {
                body_bytes: self.encode_body(tx)?,
                auth_info_bytes: self.encode_auth_info(tx, SignMode::Direct),
                chain_id: tx.signer.chain_id.clone(),
                account_number: tx.signer.account_number,
            })),
            SignMode::Amino => {
                let msgs = tx
                    .messages
                    .iter()
                    .map(|msg| self.registry.to_amino(&msg.type_url, msg.value.as_ref()))
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(SignDoc::Amino(StdSignDoc {
                    account_number: tx.signer.account_number.to_string(),
                    chain_id: tx.signer.chain_id.clone(),
                    fee: tx.fee.to_std_fee(),
                    memo: tx.memo.clone(),
                    msgs,
                    sequence: tx.signer.sequence.to_string(),
                    timeout_height: (tx.timeout_height != 0)
                        .then(|| tx.timeout_height.to_string()),
                }))
            }
        }
    }

    /// Assemble the raw transaction. In direct mode the signed body and auth
    /// info bytes are reused as-is so the node hashes exactly what was signed.
    pub fn serialize(
        &self,
        tx: &UnsignedTx,
        sign_doc: &SignDoc,
        signature: &Signature,
    ) -> Result<TxRaw> {
        let (body_bytes, auth_info_bytes) = match sign_doc {
            SignDoc::Direct(doc) => (doc.body_bytes.clone(), doc.auth_info_bytes.clone()),
            SignDoc::Amino(_) => (
                self.encode_body(tx)?,
                self.encode_auth_info(tx, SignMode::Amino),
            ),
        };

        Ok(TxRaw {
            body_bytes,
            auth_info_bytes,
            signatures: vec![signature.signature.clone()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmlink_codec::msgs::MsgSend;
    use cosmlink_codec::{default_registry, CodecError};
    use cosmlink_math::Coin;
    use cosmlink_types::proto::mode_info_proto::Sum;
    use cosmlink_types::{Algo, PubKey};

    fn builder() -> TxBuilder {
        TxBuilder::new(Arc::new(default_registry()))
    }

    fn context() -> SignerContext {
        SignerContext {
            account_number: 12,
            sequence: 4,
            chain_id: "testing".to_string(),
            pub_key: PubKey::new(Algo::Secp256k1, vec![2; 33]),
        }
    }

    fn send() -> TypedMessage {
        TypedMessage::new(MsgSend {
            from_address: "cosmos1from".to_string(),
            to_address: "cosmos1to".to_string(),
            amount: vec![Coin::new("ucosm", "1234").unwrap()],
        })
    }

    fn fee() -> Fee {
        Fee::new(vec![Coin::new("ucosm", "2000").unwrap()], 80_000)
    }

    fn mode_of(auth_info_bytes: &[u8]) -> i32 {
        let auth_info = AuthInfoProto::decode(auth_info_bytes).unwrap();
        match auth_info.signer_infos[0].mode_info.clone().unwrap().sum {
            Some(Sum::Single(single)) => single.mode,
            None => panic!("missing mode info"),
        }
    }

    #[test]
    fn test_empty_message_list() {
        let err = builder()
            .build_unsigned(vec![], fee(), "", context())
            .unwrap_err();
        assert!(matches!(err, ClientError::EmptyMessageList));
    }

    #[test]
    fn test_unregistered_message() {
        let msg = TypedMessage::from_parts("/unknown.v1.MsgFoo", Box::new(1u32));
        let err = builder()
            .build_unsigned(vec![msg], fee(), "", context())
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Codec(CodecError::UnknownTypeUrl(ref url)) if url == "/unknown.v1.MsgFoo"
        ));
    }

    #[test]
    fn test_direct_sign_doc() {
        let builder = builder();
        let tx = builder
            .build_unsigned(vec![send()], fee(), "hello", context())
            .unwrap();
        let SignDoc::Direct(doc) = builder.compute_sign_bytes(&tx, SignMode::Direct).unwrap()
        else {
            panic!("expected direct sign doc");
        };
        assert_eq!(doc.chain_id, "testing");
        assert_eq!(doc.account_number, 12);
        assert_eq!(mode_of(&doc.auth_info_bytes), 1);

        let body = TxBodyProto::decode(doc.body_bytes.as_slice()).unwrap();
        assert_eq!(body.memo, "hello");
        assert_eq!(body.messages[0].type_url, "/cosmos.bank.v1beta1.MsgSend");

        let auth_info = AuthInfoProto::decode(doc.auth_info_bytes.as_slice()).unwrap();
        assert_eq!(auth_info.signer_infos[0].sequence, 4);
        assert_eq!(auth_info.fee.unwrap().gas_limit, 80_000);
    }

    #[test]
    fn test_amino_sign_doc() {
        let builder = builder();
        let tx = builder
            .build_unsigned(vec![send()], fee(), "", context())
            .unwrap();
        let doc = builder.compute_sign_bytes(&tx, SignMode::Amino).unwrap();
        let bytes = String::from_utf8(doc.sign_bytes().unwrap()).unwrap();
        assert!(bytes.starts_with(r#"{"account_number":"12","chain_id":"testing","#));
        assert!(bytes.contains(r#""msgs":[{"type":"cosmos-sdk/MsgSend","#));
        assert!(bytes.ends_with(r#""sequence":"4"}"#));
    }

    #[test]
    fn test_serialize_reuses_signed_bytes() {
        let builder = builder();
        let tx = builder
            .build_unsigned(vec![send()], fee(), "", context())
            .unwrap();
        let signature = Signature {
            signature: vec![9; 64],
            pub_key: context().pub_key,
        };

        let doc = builder.compute_sign_bytes(&tx, SignMode::Direct).unwrap();
        let raw = builder.serialize(&tx, &doc, &signature).unwrap();
        let SignDoc::Direct(direct) = &doc else {
            panic!("expected direct sign doc");
        };
        assert_eq!(raw.body_bytes, direct.body_bytes);
        assert_eq!(raw.auth_info_bytes, direct.auth_info_bytes);
        assert_eq!(raw.signatures, vec![vec![9; 64]]);

        let doc = builder.compute_sign_bytes(&tx, SignMode::Amino).unwrap();
        let raw = builder.serialize(&tx, &doc, &signature).unwrap();
        assert_eq!(mode_of(&raw.auth_info_bytes), 127);

        let signed = SignedTx::from(raw);
        assert_eq!(signed.tx_hash.len(), 64);
        assert_eq!(TxRaw::decode(signed.tx_bytes.as_slice()).unwrap(), signed.raw_tx);
    }
}
