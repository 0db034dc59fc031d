// ABOUTME: Tar archive assembly for artifacts, optionally gzip-compressed.
// ABOUTME: Blocking; callers run it on the blocking pool.

use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use crate::config::Compression;

/// One thing to put in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entry {
    /// A file or directory on disk, stored under `archive`.
    Path { host: PathBuf, archive: PathBuf },
    /// Literal content stored as a regular file.
    File { content: String, path: PathBuf },
}

/// Write `entries` into a new archive at `dest`.
pub(crate) fn write_archive(dest: &Path, entries: &[Entry], compression: Compression) -> io::Result<()> {
    let file = File::create(dest)?;
    match compression {
        Compression::None => {
            let mut builder = tar::Builder::new(file);
            append_all(&mut builder, entries)?;
            builder.into_inner()?.flush()
        }
        Compression::Gzip => {
            let encoder = GzEncoder::new(file, flate2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            append_all(&mut builder, entries)?;
            builder.into_inner()?.finish()?.flush()
        }
    }
}

fn append_all<W: Write>(builder: &mut tar::Builder<W>, entries: &[Entry]) -> io::Result<()> {
    builder.follow_symlinks(false);

    for entry in entries {
        match entry {
            Entry::Path { host, archive } => {
                let name = relative(archive)?;
                if host.is_dir() {
                    builder.append_dir_all(&name, host)?;
                } else {
                    builder.append_path_with_name(host, &name)?;
                }
            }
            Entry::File { content, path } => {
                let mut header = tar::Header::new_gnu();
                header.set_size(content.len() as u64);
                header.set_mode(0o644);
                header.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);
                header.set_cksum();
                builder.append_data(&mut header, relative(path)?, content.as_bytes())?;
            }
        }
    }
    Ok(())
}

/// Archive member names are relative; a leading `/` is dropped and `..` refused.
fn relative(path: &Path) -> io::Result<PathBuf> {
    let mut name = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => name.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("archive path {} leaves the archive root", path.display()),
                ));
            }
        }
    }
    if name.as_os_str().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty archive path",
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::collections::BTreeMap;
    use std::io::Read;
    use tempfile::TempDir;

    fn members<R: Read>(reader: R) -> BTreeMap<String, String> {
        let mut archive = tar::Archive::new(reader);
        let mut found = BTreeMap::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            if entry.header().entry_type().is_dir() {
                continue;
            }
            let name = entry.path().unwrap().display().to_string();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            found.insert(name, content);
        }
        found
    }

    #[test]
    fn gzip_archive_holds_files_and_directories() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        std::fs::create_dir_all(site.join("css")).unwrap();
        std::fs::write(site.join("index.html"), "hello").unwrap();
        std::fs::write(site.join("css/app.css"), "body{}").unwrap();

        let dest = dir.path().join("out.tar.gz");
        let entries = vec![
            Entry::Path {
                host: site,
                archive: PathBuf::from("/www"),
            },
            Entry::File {
                content: "628".to_string(),
                path: PathBuf::from("VERSION"),
            },
        ];
        write_archive(&dest, &entries, Compression::Gzip).unwrap();

        let found = members(GzDecoder::new(File::open(&dest).unwrap()));
        assert_eq!(found.get("www/index.html").map(String::as_str), Some("hello"));
        assert_eq!(found.get("www/css/app.css").map(String::as_str), Some("body{}"));
        assert_eq!(found.get("VERSION").map(String::as_str), Some("628"));
    }

    #[test]
    fn plain_tar_when_uncompressed() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.tar");
        let entries = vec![Entry::File {
            content: "x".to_string(),
            path: PathBuf::from("a/b.txt"),
        }];
        write_archive(&dest, &entries, Compression::None).unwrap();

        let found = members(File::open(&dest).unwrap());
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["a/b.txt"]);
    }

    #[test]
    fn parent_components_are_refused() {
        assert!(relative(Path::new("../etc/passwd")).is_err());
        assert!(relative(Path::new("/")).is_err());
        assert_eq!(relative(Path::new("/opt/app")).unwrap(), PathBuf::from("opt/app"));
    }
}
