//! Environment-based configuration, read directly via `std::env::var` —
//! no config-file crate.
pub struct Config {
    pub bind_addr: String,
    pub test_mode: bool,
    pub escrow_secret: String,
    pub house_account: String,
    pub rpc_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").expect("BIND_ADDR must be set"),
            test_mode: std::env::var("TEST_MODE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            escrow_secret: std::env::var("ESCROW_SECRET").unwrap_or_default(),
            house_account: std::env::var("HOUSE_ACCOUNT").expect("HOUSE_ACCOUNT must be set"),
            rpc_endpoint: std::env::var("RPC_ENDPOINT").ok(),
        }
    }

    /// Public escrow address derived from the escrow secret — never the
    /// secret itself, surfaced over `GET /api/escrow`.
    pub fn escrow_address(&self) -> String {
        use sha2::Digest;
        let digest = sha2::Sha256::digest(self.escrow_secret.as_bytes());
        let hex: String = digest[..20].iter().map(|b| format!("{b:02x}")).collect();
        format!("0x{hex}")
    }
}
