// Local HTTP fixture server for tests. Serves canned bodies over HTTP/1.1
// with `Connection: close` and counts requests per path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use sha1::{Digest, Sha1};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

type Routes = Arc<Mutex<HashMap<String, Vec<u8>>>>;
type Hits = Arc<Mutex<HashMap<String, usize>>>;

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

pub struct FixtureServer {
    addr: SocketAddr,
    routes: Routes,
    hits: Hits,
    task: JoinHandle<()>,
}

impl FixtureServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Routes = Arc::default();
        let hits: Hits = Arc::default();

        let task = {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&hits);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = Arc::clone(&routes);
                    let hits = Arc::clone(&hits);
                    tokio::spawn(async move {
                        let _ = respond(stream, routes, hits).await;
                    });
                }
            })
        };

        Self {
            addr,
            routes,
            hits,
            task,
        }
    }

    pub fn serve(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), body.into());
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond(mut stream: TcpStream, routes: Routes, hits: Hits) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut buf = [0_u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = stream.read(&mut buf).await?;
        if read == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..read]);
    }

    let head = String::from_utf8_lossy(&head);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target).to_string();

    *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
    let body = routes.lock().unwrap().get(&path).cloned();

    let (status, body) = match body {
        Some(body) => ("200 OK", body),
        None => ("404 Not Found", b"not found".to_vec()),
    };
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(&body).await?;
    stream.shutdown().await
}

/// Everything a vanilla version needs, published on a fixture server.
pub struct PublishedVersion {
    pub id: String,
    pub client_jar: Vec<u8>,
    pub asset_index: Vec<u8>,
    /// As listed in the index, duplicates included.
    pub asset_objects: Vec<Vec<u8>>,
    pub libraries: Vec<(String, Vec<u8>)>,
}

impl PublishedVersion {
    pub fn manifest_url(server: &FixtureServer) -> String {
        server.url("/mc/version_manifest_v2.json")
    }

    pub fn resources_base(server: &FixtureServer) -> String {
        server.url("/res")
    }

    /// Bytes a fresh install credits to progress.
    pub fn fresh_install_bytes(&self) -> u64 {
        (self.client_jar.len()
            + self.asset_index.len()
            + self.asset_objects.iter().map(Vec::len).sum::<usize>()
            + self.libraries.iter().map(|(_, b)| b.len()).sum::<usize>()) as u64
    }
}

/// Publish manifest, version document, client jar, asset index, objects and
/// libraries for `id`. `libraries` holds (relative path, content) pairs.
pub fn publish_version(
    server: &FixtureServer,
    id: &str,
    asset_objects: &[&[u8]],
    libraries: &[(&str, &[u8])],
) -> PublishedVersion {
    let client_jar: Vec<u8> = (0..5000_u32).map(|i| (i % 256) as u8).collect();
    server.serve("/client.jar", client_jar.clone());

    let mut objects = serde_json::Map::new();
    for (i, object) in asset_objects.iter().enumerate() {
        let hash = sha1_hex(object);
        server.serve(&format!("/res/{}/{}", &hash[..2], hash), object.to_vec());
        objects.insert(
            format!("minecraft/sounds/{}.ogg", i),
            serde_json::json!({ "hash": hash, "size": object.len() }),
        );
    }
    let asset_index = serde_json::to_vec(&serde_json::json!({ "objects": objects })).unwrap();
    server.serve("/indexes/5.json", asset_index.clone());

    // Counted per entry, duplicates included.
    let total_size: usize = asset_objects.iter().map(|o| o.len()).sum();

    let library_entries: Vec<_> = libraries
        .iter()
        .map(|(path, content)| {
            let route = format!("/libraries/{}", path);
            server.serve(&route, content.to_vec());
            serde_json::json!({
                "name": format!("test:{}:1.0", path),
                "downloads": {
                    "artifact": {
                        "path": path,
                        "sha1": sha1_hex(content),
                        "size": content.len(),
                        "url": server.url(&route)
                    }
                }
            })
        })
        .collect();

    let version_doc = serde_json::to_vec(&serde_json::json!({
        "id": id,
        "type": "release",
        "mainClass": "net.minecraft.client.main.Main",
        "javaVersion": { "component": "java-runtime-gamma", "majorVersion": 17 },
        "assetIndex": {
            "id": "5",
            "sha1": sha1_hex(&asset_index),
            "size": asset_index.len(),
            "totalSize": total_size,
            "url": server.url("/indexes/5.json")
        },
        "downloads": {
            "client": {
                "sha1": sha1_hex(&client_jar),
                "size": client_jar.len(),
                "url": server.url("/client.jar")
            }
        },
        "libraries": library_entries,
        "arguments": {
            "game": [
                "--username", "${auth_player_name}",
                "--version", "${version_name}",
                "--gameDir", "${game_directory}",
                "--assetsDir", "${assets_root}",
                "--assetIndex", "${assets_index_name}",
                "--uuid", "${auth_uuid}",
                "--accessToken", "${auth_access_token}"
            ]
        }
    }))
    .unwrap();
    let doc_route = format!("/v1/packages/{}.json", id);
    server.serve(&doc_route, version_doc.clone());

    let manifest = serde_json::json!({
        "latest": { "release": id, "snapshot": id },
        "versions": [{
            "id": id,
            "type": "release",
            "url": server.url(&doc_route),
            "sha1": sha1_hex(&version_doc)
        }]
    });
    server.serve(
        "/mc/version_manifest_v2.json",
        serde_json::to_vec(&manifest).unwrap(),
    );

    PublishedVersion {
        id: id.to_string(),
        client_jar,
        asset_index,
        asset_objects: asset_objects.iter().map(|o| o.to_vec()).collect(),
        libraries: libraries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_vec()))
            .collect(),
    }
}

/// A managed runtime whose only file is `bin/java`, published for the linux
/// platform under `java-runtime-gamma`.
pub struct PublishedRuntime {
    pub java: Vec<u8>,
    pub manifest_sha1: String,
}

impl PublishedRuntime {
    pub const JAVA_ROUTE: &'static str = "/runtime/files/java";
    pub const MANIFEST_ROUTE: &'static str = "/runtime/java-runtime-gamma.json";

    pub fn index_url(server: &FixtureServer) -> String {
        server.url("/runtime/all.json")
    }
}

/// Publish index, file manifest and `bin/java`. Publishing again with other
/// content replaces all three.
pub fn publish_runtime(server: &FixtureServer, java: &[u8]) -> PublishedRuntime {
    server.serve(PublishedRuntime::JAVA_ROUTE, java.to_vec());

    let manifest = serde_json::to_vec(&serde_json::json!({
        "files": {
            "bin": { "type": "directory" },
            "bin/java": {
                "type": "file",
                "executable": true,
                "downloads": {
                    "raw": {
                        "sha1": sha1_hex(java),
                        "size": java.len(),
                        "url": server.url(PublishedRuntime::JAVA_ROUTE)
                    }
                }
            }
        }
    }))
    .unwrap();
    server.serve(PublishedRuntime::MANIFEST_ROUTE, manifest.clone());
    let manifest_sha1 = sha1_hex(&manifest);

    let index = serde_json::json!({
        "linux": {
            "java-runtime-gamma": [{
                "manifest": {
                    "sha1": manifest_sha1,
                    "size": manifest.len(),
                    "url": server.url(PublishedRuntime::MANIFEST_ROUTE)
                },
                "version": { "name": "17.0.8", "released": "2023-08-01T00:00:00+00:00" }
            }]
        }
    });
    server.serve("/runtime/all.json", serde_json::to_vec(&index).unwrap());

    PublishedRuntime {
        java: java.to_vec(),
        manifest_sha1,
    }
}
