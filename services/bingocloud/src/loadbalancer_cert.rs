use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stratus_core::model::{status, CloudLoadbalancerCertificate, CloudResource};
use stratus_core::time::{self, DateTime};
use stratus_core::{hash, value, Error, Result};

use crate::region::Region;

/// A server certificate usable by HTTPS listeners.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub(crate) region: Region,
    pub(crate) payload: CertificatePayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(crate) struct CertificatePayload {
    pub(crate) path: String,
    pub(crate) server_certificate_name: String,
    pub(crate) server_certificate_id: String,
    pub(crate) upload_date: String,
    pub(crate) owner_id: String,
    pub(crate) expiration: String,
    pub(crate) not_after: String,
    pub(crate) not_before: String,
    pub(crate) certificate_body: String,
    pub(crate) certificate_chain: String,
}

impl Region {
    pub(crate) async fn list_certificates(&self) -> Result<Vec<CertificatePayload>> {
        let params = vec![("MaxItems".to_string(), "3000".to_string())];
        let resp = self.invoke("ListServerCertificates", params).await?;
        value::decode_list_at(
            &resp,
            &["ListServerCertificatesResult", "ServerCertificateMetadataList"],
        )
    }

    /// All certificates owned by the account.
    pub async fn certificates(&self) -> Result<Vec<Certificate>> {
        let owner = self.client.account_user().await;
        let payloads = self.list_certificates().await?;
        Ok(payloads
            .into_iter()
            .filter(|payload| payload.owner_id == owner)
            .map(|payload| Certificate {
                region: self.clone(),
                payload,
            })
            .collect())
    }

    /// One certificate by id.
    pub async fn certificate(&self, id: &str) -> Result<Certificate> {
        self.certificates()
            .await?
            .into_iter()
            .find(|certificate| certificate.payload.server_certificate_id == id)
            .ok_or_else(|| Error::not_found(format!("certificate {id}")))
    }

    /// Uploads a PEM certificate plus key and returns the stored copy.
    pub async fn create_certificate(
        &self,
        name: &str,
        certificate_pem: &str,
        private_key_pem: &str,
    ) -> Result<Certificate> {
        let params = vec![
            ("ServerCertificateName".to_string(), name.to_string()),
            ("CertificateBody".to_string(), certificate_pem.to_string()),
            ("PrivateKey".to_string(), private_key_pem.to_string()),
        ];
        let resp = self.invoke("UploadServerCertificate", params).await?;
        let id: String = value::decode_at(
            &resp,
            &[
                "UploadServerCertificateResult",
                "ServerCertificateMetadata",
                "ServerCertificateId",
            ],
        )?;
        self.certificate(&id).await
    }
}

#[async_trait]
impl CloudResource for Certificate {
    fn id(&self) -> String {
        self.payload.server_certificate_id.clone()
    }

    fn name(&self) -> String {
        self.payload.server_certificate_name.clone()
    }

    fn global_id(&self) -> String {
        self.payload.server_certificate_id.clone()
    }

    fn status(&self) -> String {
        status::ENABLED.to_string()
    }

    async fn refresh(&mut self) -> Result<()> {
        let fresh = self
            .region
            .certificate(&self.payload.server_certificate_id)
            .await?;
        value::overlay(&mut self.payload, &serde_json::to_value(fresh.payload)?)
    }
}

#[async_trait]
impl CloudLoadbalancerCertificate for Certificate {
    fn common_name(&self) -> String {
        // The provider never returns the parsed subject and this crate
        // does not parse PEM bodies itself.
        String::new()
    }

    fn subject_alternative_names(&self) -> String {
        String::new()
    }

    fn expire_time(&self) -> Option<DateTime> {
        time::parse(&self.payload.expiration).ok()
    }

    async fn fingerprint(&mut self) -> Result<String> {
        let body = self.public_key().await?;
        if body.is_empty() {
            return Ok(String::new());
        }
        let hex = hash::hex_sha1(body.as_bytes());
        let pairs: Vec<String> = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).to_string())
            .collect();
        Ok(format!("sha1:{}", pairs.join(":")))
    }

    async fn public_key(&mut self) -> Result<String> {
        if self.payload.certificate_body.is_empty() {
            let params = vec![(
                "ServerCertificateName".to_string(),
                self.payload.server_certificate_name.clone(),
            )];
            let resp = self.region.invoke("GetServerCertificate", params).await?;
            let body: String = value::decode_at(
                &resp,
                &[
                    "GetServerCertificateResult",
                    "ServerCertificate",
                    "CertificateBody",
                ],
            )?;
            self.payload.certificate_body = body;
        }
        Ok(self.payload.certificate_body.clone())
    }

    fn private_key(&self) -> String {
        String::new()
    }

    async fn delete(&self) -> Result<()> {
        // Deletion is keyed by name, not id.
        let params = vec![(
            "ServerCertificateName".to_string(),
            self.payload.server_certificate_name.clone(),
        )];
        self.region.invoke("DeleteServerCertificate", params).await?;
        Ok(())
    }
}
