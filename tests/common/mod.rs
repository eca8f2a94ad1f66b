#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod exports {
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};

    /// Directory node
    pub fn dir(id: i64, name: &str, children: Vec<Value>) -> Value {
        json!({"id": id, "type": 1, "name": name, "children": children})
    }

    /// Text file node with the given data source code
    pub fn file(id: i64, name: &str, data_source: i64, content: &str) -> Value {
        json!({
            "id": id,
            "type": 0,
            "name": name,
            "mime": "text/plain",
            "dataSource": data_source,
            "content": content,
        })
    }

    /// Export with two interfaces, one user data type, one referenced template
    /// and a mock API root (id 20) and mock view root (id 21).
    pub fn demo_export(docs: Vec<Value>) -> Value {
        json!({
            "project": {"name": "Demo"},
            "specs": [{
                "spec": {
                    "name": "web",
                    "viewExt": "ftl",
                    "attributes": {"mockApiRoot": 20, "mockViewRoot": 21}
                },
                "docs": docs,
            }],
            "interfaces": [
                {
                    "id": 1,
                    "name": "getUser",
                    "method": "get",
                    "path": "/user",
                    "resFormat": 0,
                    "params": {"inputs": [], "outputs": [{"name": "name", "type": 10001}]}
                },
                {
                    "id": 2,
                    "name": "createUser",
                    "method": "post",
                    "path": "/user/create",
                    "resFormat": 0,
                    "params": {"inputs": [], "outputs": []}
                }
            ],
            "datatypes": [
                {"id": 10001, "name": "String", "format": 3, "type": 1},
                {"id": 1, "name": "User", "format": 0, "type": 0,
                 "params": [{"name": "name", "type": 10001}]}
            ],
            "templates": [
                {"id": 5, "name": "Index", "path": "index", "description": "home"}
            ],
            "pages": [
                {"id": 9, "name": "home", "path": "/home",
                 "templates": [{"id": 5, "path": "index.ftl"}]}
            ],
            "constraints": {}
        })
    }

    /// Write an export as JSON into `dir`
    pub fn write_export(dir: &Path, name: &str, export: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(export).unwrap()).unwrap();
        path
    }
}

pub mod recording {
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use stubsmith::providers::{Downloader, FileSystem, LocalFs, ProjectFileUpdater, ProjectManifest};

    /// Local disk that resolves relative paths against `base` instead of the
    /// process working directory
    pub struct RootedFs {
        pub base: PathBuf,
    }

    impl RootedFs {
        fn resolve(&self, path: &Path) -> PathBuf {
            self.base.join(path)
        }
    }

    impl FileSystem for RootedFs {
        fn exists(&self, path: &Path) -> bool {
            LocalFs.exists(&self.resolve(path))
        }
        fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            LocalFs.write(&self.resolve(path), contents)
        }
        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            LocalFs.create_dir_all(&self.resolve(path))
        }
        fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
            LocalFs.remove_dir_all(&self.resolve(path))
        }
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            LocalFs.read_to_string(&self.resolve(path))
        }
        fn read_dir_names(&self, path: &Path) -> io::Result<Vec<String>> {
            LocalFs.read_dir_names(&self.resolve(path))
        }
    }

    /// Records requested downloads instead of fetching them
    #[derive(Default)]
    pub struct RecordingDownloader {
        pub requests: Mutex<Vec<(String, PathBuf)>>,
    }

    impl Downloader for RecordingDownloader {
        fn download(&self, url: &str, dest: &Path) {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf()));
        }
    }

    impl RecordingDownloader {
        pub fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }
    }

    /// Records project-file updates
    #[derive(Default)]
    pub struct RecordingProjectUpdater {
        pub calls: Mutex<Vec<(ProjectManifest, Vec<PathBuf>)>>,
    }

    impl ProjectFileUpdater for RecordingProjectUpdater {
        fn update(&self, manifest: &ProjectManifest, tracked_dirs: &[PathBuf]) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((manifest.clone(), tracked_dirs.to_vec()));
            Ok(())
        }
    }
}
