//! Redis-backed OTP cache. One hash per phone number under `otp:{phone}`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::common::StoreError;
use crate::domains::auth::PendingOtp;
use crate::kernel::postgres_stores::bounded;
use crate::kernel::BaseOtpCache;

const KEY_PREFIX: &str = "otp:";

/// Delete the hash only if its `otp` field still equals ARGV[1].
const CONSUME_SCRIPT: &str = r#"
if redis.call('HGET', KEYS[1], 'otp') == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
"#;

pub fn otp_key(phone_number: &str) -> String {
    format!("{KEY_PREFIX}{phone_number}")
}

#[derive(Clone)]
pub struct RedisOtpCache {
    conn: ConnectionManager,
    consume: Script,
}

impl RedisOtpCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            consume: Script::new(CONSUME_SCRIPT),
        }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = bounded(async { Ok(ConnectionManager::new(client).await?) }).await?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl BaseOtpCache for RedisOtpCache {
    async fn put(
        &self,
        phone_number: &str,
        pending: &PendingOtp,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = otp_key(phone_number);
        let mut conn = self.conn.clone();

        // HSET and EXPIRE together so the record never lives without a TTL.
        bounded(async {
            let (): () = redis::pipe()
                .atomic()
                .hset_multiple(&key, &[("name", pending.name.as_str()), ("otp", pending.otp.as_str())])
                .ignore()
                .expire(&key, ttl.as_secs() as i64)
                .ignore()
                .query_async(&mut conn)
                .await?;
            Ok(())
        })
        .await
    }

    async fn get(&self, phone_number: &str) -> Result<Option<PendingOtp>, StoreError> {
        let key = otp_key(phone_number);
        let mut conn = self.conn.clone();

        let mut fields = bounded(async {
            let fields: HashMap<String, String> = conn.hgetall(&key).await?;
            Ok(fields)
        })
        .await?;

        match (fields.remove("name"), fields.remove("otp")) {
            (Some(name), Some(otp)) => Ok(Some(PendingOtp { name, otp })),
            _ => Ok(None),
        }
    }

    async fn consume(&self, phone_number: &str, otp: &str) -> Result<bool, StoreError> {
        let key = otp_key(phone_number);
        let mut conn = self.conn.clone();

        let deleted: i64 = bounded(async {
            let deleted: i64 = self.consume.key(&key).arg(otp).invoke_async(&mut conn).await?;
            Ok(deleted)
        })
        .await?;
        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        bounded(async {
            let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_namespaced() {
        assert_eq!(otp_key("9998887777"), "otp:9998887777");
    }
}
