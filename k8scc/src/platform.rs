//! Registry of the chaincode languages the builder knows how to compile and start.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Script compiling Go chaincode into `/chaincode/output/chaincode`.
///
/// `{path}` is the package path declared in `metadata.json`. Module aware
/// builds are preferred, GOPATH mode is the fallback.
const GOLANG_BUILD_SCRIPT: &str = r#"
set -e
if [ -f "/chaincode/input/src/go.mod" ] && [ -d "/chaincode/input/src/vendor" ]; then
    cd /chaincode/input/src
    GO111MODULE=on go build -v -mod=vendor {ldflags} -o /chaincode/output/chaincode {path}
elif [ -f "/chaincode/input/src/go.mod" ]; then
    cd /chaincode/input/src
    GO111MODULE=on go build -v -mod=readonly {ldflags} -o /chaincode/output/chaincode {path}
elif [ -f "/chaincode/input/src/{path}/go.mod" ] && [ -d "/chaincode/input/src/{path}/vendor" ]; then
    cd /chaincode/input/src/{path}
    GO111MODULE=on go build -v -mod=vendor {ldflags} -o /chaincode/output/chaincode .
elif [ -f "/chaincode/input/src/{path}/go.mod" ]; then
    cd /chaincode/input/src/{path}
    GO111MODULE=on go build -v -mod=readonly {ldflags} -o /chaincode/output/chaincode .
else
    GO111MODULE=off GOPATH=/chaincode/input:$GOPATH go build -v {ldflags} -o /chaincode/output/chaincode {path}
fi
echo Done!
"#;

const GOLANG_LDFLAGS: &str = r#"-ldflags "-linkmode external -extldflags '-static'""#;

const NODE_BUILD_SCRIPT: &str = r#"
set -e
cp -R /chaincode/input/src/. /chaincode/output
cd /chaincode/output
npm install --production
"#;

const JAVA_BUILD_SCRIPT: &str = "/root/chaincode-java/build.sh";

/// Module proxy of Go builds, overridable through the builder `env` configuration.
const GOLANG_DEFAULT_PROXY: &str = "https://proxy.golang.org";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("chaincode type {0:?} is not supported")]
    Unsupported(String),
}

/// A chaincode language runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Golang,
    Node,
    Java,
}

/// How to compile a chaincode inside the builder container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Script run with `/bin/sh -c`.
    pub command: String,
    /// Environment of the build step, before configuration entries.
    pub env: Vec<(String, String)>,
}

/// How to start a compiled chaincode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    /// Command and arguments of the chaincode container.
    pub command: Vec<String>,
    /// Where the build output is mounted, also the working directory.
    pub mount_dir: &'static str,
}

impl Platform {
    /// Build instructions for the chaincode package at `chaincode_path`.
    pub fn build_spec(&self, chaincode_path: &str) -> BuildSpec {
        match self {
            Platform::Golang => BuildSpec {
                command: GOLANG_BUILD_SCRIPT
                    .replace("{ldflags}", GOLANG_LDFLAGS)
                    .replace("{path}", chaincode_path),
                env: vec![("GOPROXY".to_owned(), GOLANG_DEFAULT_PROXY.to_owned())],
            },
            Platform::Node => BuildSpec {
                command: NODE_BUILD_SCRIPT.to_owned(),
                env: Vec::new(),
            },
            Platform::Java => BuildSpec {
                command: JAVA_BUILD_SCRIPT.to_owned(),
                env: Vec::new(),
            },
        }
    }

    /// Start instructions for a chaincode connecting to `peer_address`.
    pub fn run_spec(&self, peer_address: &str) -> RunSpec {
        let mount_dir = self.mount_dir();
        let command = match self {
            Platform::Golang => vec![
                format!("{mount_dir}/chaincode"),
                "-peer.address".to_owned(),
                peer_address.to_owned(),
            ],
            Platform::Node => vec![
                "npm".to_owned(),
                "start".to_owned(),
                "--".to_owned(),
                "--peer.address".to_owned(),
                peer_address.to_owned(),
            ],
            Platform::Java => vec![
                "/root/chaincode-java/start".to_owned(),
                "--peerAddress".to_owned(),
                peer_address.to_owned(),
            ],
        };

        RunSpec { command, mount_dir }
    }

    fn mount_dir(&self) -> &'static str {
        match self {
            Platform::Golang => "/usr/local/chaincode",
            Platform::Node => "/usr/local/src",
            Platform::Java => "/root/chaincode-java/chaincode",
        }
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    /// Parses the chaincode type of `metadata.json`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "golang" | "go" => Ok(Platform::Golang),
            "node" => Ok(Platform::Node),
            "java" => Ok(Platform::Java),
            _ => Err(PlatformError::Unsupported(s.to_owned())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Golang => "golang",
            Platform::Node => "node",
            Platform::Java => "java",
        };

        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chaincode_types() {
        assert_eq!("GOLANG".parse(), Ok(Platform::Golang));
        assert_eq!("go".parse(), Ok(Platform::Golang));
        assert_eq!("Node".parse(), Ok(Platform::Node));
        assert_eq!("java".parse(), Ok(Platform::Java));
        assert_eq!(
            "car".parse::<Platform>(),
            Err(PlatformError::Unsupported("car".to_owned()))
        );
    }

    #[test]
    fn display_round_trips() {
        for platform in [Platform::Golang, Platform::Node, Platform::Java] {
            assert_eq!(platform.to_string().parse(), Ok(platform));
        }
    }

    #[test]
    fn golang_build_uses_package_path() {
        let spec = Platform::Golang.build_spec("github.com/example/fabcar");

        assert!(spec.command.contains("/chaincode/input/src/github.com/example/fabcar/go.mod"));
        assert!(spec.command.contains("-o /chaincode/output/chaincode github.com/example/fabcar"));
        assert!(!spec.command.contains("{path}"));
        assert!(!spec.command.contains("{ldflags}"));
    }

    #[test]
    fn build_env_does_not_depend_on_process_environment() {
        let spec = Platform::Golang.build_spec("github.com/example/fabcar");

        assert_eq!(
            spec.env,
            vec![("GOPROXY".to_owned(), "https://proxy.golang.org".to_owned())]
        );
        assert!(Platform::Node.build_spec("").env.is_empty());
    }

    #[test]
    fn run_spec_connects_to_peer() {
        let spec = Platform::Golang.run_spec("peer0:7052");

        assert_eq!(spec.mount_dir, "/usr/local/chaincode");
        assert_eq!(
            spec.command,
            vec!["/usr/local/chaincode/chaincode", "-peer.address", "peer0:7052"]
        );
        assert_eq!(Platform::Node.run_spec("peer0:7052").command.last().unwrap(), "peer0:7052");
    }
}
