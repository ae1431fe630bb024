//! Static display labels
//!
//! Log prefixes and node names never change at runtime, so they live in a
//! constant table instead of process state.

/// Display labels shared by log lines and node names
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    /// Emoji placed after the timestamp of every log line
    pub log_emoji: &'static str,
    /// Suffix appended to node identifiers
    pub node_suffix: &'static str,
}

/// The label table
pub const LABELS: Labels = Labels {
    log_emoji: "🐑",
    node_suffix: "|Mie",
};

/// Node category, one per backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    /// MinIO nodes
    Minio,
    /// Aliyun OSS nodes
    AliyunOss,
}

impl NodeCategory {
    /// Category path as shown in the host's node menu
    pub fn path(&self) -> &'static str {
        match self {
            Self::Minio => "🐑 Minio-Connector/🐑 Minio Connector",
            Self::AliyunOss => "🐑 Minio-Connector/🐑 Aliyun OSS Connector",
        }
    }
}

/// One node exposed to the host application
#[derive(Debug, Clone, Copy)]
pub struct NodeLabel {
    /// Node identifier without suffix
    pub id: &'static str,
    /// Human-readable title without emoji
    pub title: &'static str,
    /// Menu category
    pub category: NodeCategory,
    /// CLI subcommand implementing the node
    pub command: &'static str,
}

impl NodeLabel {
    /// Registered node name (`id` plus suffix)
    pub fn node_name(&self) -> String {
        format!("{}{}", self.id, LABELS.node_suffix)
    }

    /// Display name (`title` plus emoji)
    pub fn display_name(&self) -> String {
        format!("{} {}", self.title, LABELS.log_emoji)
    }
}

/// All nodes, in menu order
pub const NODES: &[NodeLabel] = &[
    NodeLabel {
        id: "InitMinioConnector",
        title: "Init Minio Connector",
        category: NodeCategory::Minio,
        command: "init",
    },
    NodeLabel {
        id: "MinioUploadFile",
        title: "Minio Upload File",
        category: NodeCategory::Minio,
        command: "upload-file",
    },
    NodeLabel {
        id: "MinioCreateBucketIfNotExists",
        title: "Minio Create Bucket If Not Exists",
        category: NodeCategory::Minio,
        command: "create-bucket",
    },
    NodeLabel {
        id: "InitAliyunOSSConnector",
        title: "Init Aliyun OSS Connector",
        category: NodeCategory::AliyunOss,
        command: "init",
    },
    NodeLabel {
        id: "AliyunOSSUploadFile",
        title: "Aliyun OSS Upload File",
        category: NodeCategory::AliyunOss,
        command: "upload-files",
    },
    NodeLabel {
        id: "AliyunOSSUploadFolder",
        title: "Aliyun OSS Upload Folder",
        category: NodeCategory::AliyunOss,
        command: "upload-folder",
    },
    NodeLabel {
        id: "AliyunOSSDownloadBucket",
        title: "Aliyun OSS Download Bucket",
        category: NodeCategory::AliyunOss,
        command: "download-bucket",
    },
];
