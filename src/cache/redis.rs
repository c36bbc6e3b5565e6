//! Redis-backed cache store.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use crate::cache::{CacheError, CacheStore};

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Store(err.to_string())
    }
}

/// A single multiplexed Redis connection shared by every request.
///
/// `ConnectionManager` reconnects on its own and is cheap to clone, so each
/// call works on a clone and no request-level locking is needed.
pub struct RedisCacheStore {
    connection: ArcSwapOption<ConnectionManager>,
    ttl: Option<Duration>,
}

impl RedisCacheStore {
    /// Connect to `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self {
            connection: ArcSwapOption::from_pointee(manager),
            ttl,
        })
    }

    fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.connection
            .load_full()
            .map(|manager| (*manager).clone())
            .ok_or(CacheError::Closed)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    /// Reads the entry as raw bytes; text and JSON decoding belong to the caller.
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut connection = self.connection()?;
        let value: Option<Vec<u8>> = connection.get(key).await?;
        Ok(value)
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let mut connection = self.connection()?;
        match self.ttl {
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
                connection.pset_ex::<_, _, ()>(key, value, millis).await?;
            }
            None => connection.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    fn close(&self) {
        if self.connection.swap(None).is_some() {
            tracing::info!("Redis cache connection released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Commands = Arc<Mutex<Vec<Vec<Vec<u8>>>>>;

    fn line(buf: &[u8], from: usize) -> Option<(&[u8], usize)> {
        let end = buf[from..].windows(2).position(|w| w == b"\r\n")? + from;
        Some((&buf[from..end], end + 2))
    }

    fn number(raw: &[u8]) -> Option<usize> {
        std::str::from_utf8(raw).ok()?.parse().ok()
    }

    /// One complete RESP array of bulk strings from the front of `buf`.
    fn parse_command(buf: &[u8]) -> Option<(Vec<Vec<u8>>, usize)> {
        let (header, mut pos) = line(buf, 0)?;
        let count = number(header.strip_prefix(b"*")?)?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            let (len, start) = line(buf, pos)?;
            let len = number(len.strip_prefix(b"$")?)?;
            if buf.len() < start + len + 2 {
                return None;
            }
            args.push(buf[start..start + len].to_vec());
            pos = start + len + 2;
        }
        Some((args, pos))
    }

    /// Minimal Redis stand-in: records every command, answers GET with
    /// `stored` and everything else with `+OK`.
    async fn start_resp_responder(stored: Option<Vec<u8>>) -> (String, Commands) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let commands: Commands = Arc::default();
        let recorded = commands.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let recorded = recorded.clone();
                let stored = stored.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 4096];
                    loop {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                        while let Some((args, used)) = parse_command(&buf) {
                            buf.drain(..used);
                            let reply = match (args[0].eq_ignore_ascii_case(b"GET"), &stored) {
                                (true, Some(value)) => {
                                    let mut reply = format!("${}\r\n", value.len()).into_bytes();
                                    reply.extend_from_slice(value);
                                    reply.extend_from_slice(b"\r\n");
                                    reply
                                }
                                (true, None) => b"$-1\r\n".to_vec(),
                                (false, _) => b"+OK\r\n".to_vec(),
                            };
                            recorded.lock().unwrap().push(args);
                            if socket.write_all(&reply).await.is_err() {
                                return;
                            }
                        }
                    }
                });
            }
        });

        (format!("redis://{}", addr), commands)
    }

    fn sent(commands: &Commands, name: &[u8]) -> Vec<Vec<Vec<u8>>> {
        commands
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args[0].eq_ignore_ascii_case(name))
            .cloned()
            .collect()
    }

    async fn store(stored: Option<Vec<u8>>, ttl: Option<Duration>) -> (Arc<dyn CacheStore>, Commands) {
        let (url, commands) = start_resp_responder(stored).await;
        let store = RedisCacheStore::connect(&url, ttl).await.unwrap();
        (Arc::new(store), commands)
    }

    #[tokio::test]
    async fn rejects_non_redis_address() {
        let result = RedisCacheStore::connect("http://localhost:6379", None).await;
        assert!(matches!(result, Err(CacheError::Store(_))));
    }

    #[tokio::test]
    async fn put_with_ttl_uses_psetex() {
        let (cache, commands) = store(None, Some(Duration::from_secs(300))).await;
        cache.put("dashboard", &serde_json::json!({"ip": "1.2.3.4"})).await.unwrap();

        let expected: Vec<Vec<u8>> = vec![
            b"PSETEX".to_vec(),
            b"dashboard".to_vec(),
            b"300000".to_vec(),
            br#"{"ip":"1.2.3.4"}"#.to_vec(),
        ];
        assert_eq!(sent(&commands, b"PSETEX"), vec![expected]);
        assert!(sent(&commands, b"SET").is_empty());
    }

    #[tokio::test]
    async fn put_without_ttl_uses_plain_set() {
        let (cache, commands) = store(None, None).await;
        cache.put("dashboard", &1u32).await.unwrap();

        let expected: Vec<Vec<u8>> = vec![b"SET".to_vec(), b"dashboard".to_vec(), b"1".to_vec()];
        assert_eq!(sent(&commands, b"SET"), vec![expected]);
        assert!(sent(&commands, b"PSETEX").is_empty());
    }

    #[tokio::test]
    async fn stored_entry_is_a_hit() {
        let (cache, commands) = store(Some(br#"{"fact":"x"}"#.to_vec()), None).await;

        let value = cache.get::<serde_json::Value>("dashboard").await.unwrap();
        assert_eq!(value, Some(serde_json::json!({"fact": "x"})));
        assert_eq!(sent(&commands, b"GET"), vec![vec![b"GET".to_vec(), b"dashboard".to_vec()]]);
    }

    #[tokio::test]
    async fn absent_entry_is_a_miss() {
        let (cache, _) = store(None, None).await;
        assert_eq!(cache.get::<serde_json::Value>("dashboard").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_utf8_entry_is_a_miss() {
        let (cache, _) = store(Some(vec![0xff, 0xfe]), None).await;
        assert_eq!(cache.get::<serde_json::Value>("dashboard").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_json_entry_is_a_miss() {
        let (cache, _) = store(Some(b"garbage".to_vec()), None).await;
        assert_eq!(cache.get::<serde_json::Value>("dashboard").await.unwrap(), None);
    }

    #[tokio::test]
    async fn closed_store_refuses_commands() {
        let (cache, commands) = store(None, None).await;
        cache.close();
        cache.close();

        assert!(matches!(cache.get::<u32>("dashboard").await, Err(CacheError::Closed)));
        assert!(matches!(cache.put("dashboard", &1u32).await, Err(CacheError::Closed)));
        assert!(sent(&commands, b"GET").is_empty());
        assert!(sent(&commands, b"SET").is_empty());
    }
}
