// 上传协议
//
// 一次上传的步骤：
// 1. 解析字节来源（文件路径或调用方给出的流）
// 2. （可选）预检：只校验大小/文件名，不传输任何字节
// 3. （可选）探测加速上传地址，失败时回退到默认上传地址
// 4. 附加 If-Match，以 multipart 表单 POST 文件内容
// 5. 解析响应 entries 的第一项，生成新的对象快照

use super::conditional::Conditional;
use super::item::{ItemInfo, ItemRef};
use crate::client::BoxClient;
use crate::error::{BoxError, Result};
use crate::session::{ApiRequest, ByteStream, FormField};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// 内容更新时 multipart 文件字段使用的文件名
pub const UNUSED_FILE_NAME: &str = "unused";

/// 上传字节来源
pub(crate) enum UploadSource {
    /// 本地文件路径（上传时以二进制只读方式打开）
    Path(PathBuf),
    /// 调用方提供的字节流
    Stream(ByteStream),
}

impl UploadSource {
    /// 打开字节来源，路径来源同时返回文件大小
    async fn open(self) -> Result<(ByteStream, Option<u64>)> {
        match self {
            UploadSource::Path(path) => {
                let file = tokio::fs::File::open(&path).await?;
                let size = file.metadata().await?.len();
                debug!("打开上传文件: path={:?}, size={}", path, size);
                Ok((Box::new(file), Some(size)))
            }
            UploadSource::Stream(stream) => Ok((stream, None)),
        }
    }
}

/// 上传选项
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// 期望的版本标记（仅内容更新）
    pub etag: Option<String>,
    /// 上传前先做预检
    pub preflight_check: bool,
    /// 预检使用的文件大小（路径来源可省略，自动取文件长度）
    ///
    /// 流来源时同时作为上传的 Content-Length，必须与流的实际长度一致
    pub preflight_expected_size: Option<u64>,
    /// 尝试使用加速上传地址
    pub upload_using_accelerator: bool,
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn preflight(mut self, expected_size: Option<u64>) -> Self {
        self.preflight_check = true;
        self.preflight_expected_size = expected_size;
        self
    }

    pub fn accelerator(mut self, enabled: bool) -> Self {
        self.upload_using_accelerator = enabled;
        self
    }
}

/// 上传的逻辑目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDestination<'a> {
    /// 在文件夹下新建文件
    NewFile { parent_id: &'a str },
    /// 更新已有文件的内容
    ExistingFile { file_id: &'a str },
}

impl UploadDestination<'_> {
    /// 标准 API 上的内容地址（预检和加速探测都请求这里）
    pub fn content_url(&self, client: &BoxClient) -> String {
        match self {
            UploadDestination::NewFile { .. } => client.api().api_url("files/content"),
            UploadDestination::ExistingFile { file_id } => client
                .api()
                .api_url(&format!("files/{}/content", urlencoding::encode(file_id))),
        }
    }

    /// 默认上传地址（上传域名）
    pub fn default_upload_url(&self, client: &BoxClient) -> String {
        client.api().upload_url_for(&self.content_url(client))
    }
}

/// 本次上传实际使用的地址
///
/// 加速地址是一次性的，每次上传重新解析，不缓存
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub default_url: String,
    pub accelerator_url: Option<String>,
}

impl UploadTarget {
    pub fn url(&self) -> &str {
        self.accelerator_url.as_deref().unwrap_or(&self.default_url)
    }
}

/// 加速探测响应
#[derive(Debug, Deserialize)]
struct AcceleratorResponse {
    #[serde(default)]
    upload_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct AcceleratorProbe {
    size: u64,
}

/// 解析上传地址
///
/// 服务端拒绝探测（API 错误）或响应无法解析时记录警告并回退到默认上传地址；
/// 网络错误照常返回给调用方
pub async fn resolve_upload_target(
    client: &BoxClient,
    destination: UploadDestination<'_>,
    file_size: Option<u64>,
) -> Result<UploadTarget> {
    let default_url = destination.default_upload_url(client);
    let probe_url = destination.content_url(client);

    let accelerator_url = match probe_accelerator(client, &probe_url, file_size).await {
        Ok(Some(url)) => {
            info!("使用加速上传地址: {}", url);
            Some(url)
        }
        Ok(None) => {
            debug!("服务端未提供加速上传地址，使用默认地址: {}", default_url);
            None
        }
        Err(e @ (BoxError::Api(_) | BoxError::Json(_) | BoxError::InvalidResponse(_))) => {
            warn!("加速上传地址探测失败，使用默认地址: {}, 错误: {}", default_url, e);
            None
        }
        Err(e) => return Err(e),
    };

    Ok(UploadTarget {
        default_url,
        accelerator_url,
    })
}

async fn probe_accelerator(
    client: &BoxClient,
    url: &str,
    file_size: Option<u64>,
) -> Result<Option<String>> {
    let mut request = ApiRequest::options(url);
    if let Some(size) = file_size {
        request = request.json(&AcceleratorProbe { size })?;
    }

    let response: AcceleratorResponse = client.send(request).await?.json().await?;
    Ok(response.upload_url.filter(|u| !u.is_empty()))
}

/// 预检请求体
///
/// `name` 未提供时整个键省略；新建文件时带上 `parent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightRequest<'a> {
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ItemRef>,
}

/// 执行预检，不传输任何字节
///
/// 服务端返回非成功状态时以 API 错误返回
pub async fn preflight(
    client: &BoxClient,
    destination: UploadDestination<'_>,
    size: u64,
    name: Option<&str>,
) -> Result<()> {
    let parent = match destination {
        UploadDestination::NewFile { parent_id } => Some(ItemRef::folder(parent_id)),
        UploadDestination::ExistingFile { .. } => None,
    };
    let payload = PreflightRequest { size, name, parent };
    let url = destination.content_url(client);

    info!("上传预检: url={}, size={}, name={:?}", url, size, name);

    let request = ApiRequest::options(url).expect_json(false).json(&payload)?;
    client.send(request).await?;

    debug!("上传预检通过: size={}", size);
    Ok(())
}

/// 上传响应
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    entries: Vec<ItemInfo>,
}

/// 执行一次完整上传，返回新版本的对象快照
///
/// # 参数
/// * `destination` - 新建文件或更新已有文件
/// * `source` - 字节来源
/// * `file_name` - multipart 文件字段的文件名
/// * `attributes` - 额外的 `attributes` 表单字段（新建文件时携带名称和父目录）
/// * `options` - 上传选项
pub(crate) async fn upload(
    client: &BoxClient,
    destination: UploadDestination<'_>,
    source: UploadSource,
    file_name: &str,
    attributes: Option<String>,
    options: &UploadOptions,
) -> Result<ItemInfo> {
    let (stream, known_size) = source.open().await?;
    let size = options.preflight_expected_size.or(known_size);
    // 路径来源以文件实际长度为准
    let length = known_size.or(options.preflight_expected_size);

    // 1. 预检失败时直接返回，不发出上传请求
    if options.preflight_check {
        let size = size.ok_or_else(|| {
            BoxError::InvalidArgument("预检需要 preflight_expected_size".to_string())
        })?;
        let name = match destination {
            UploadDestination::NewFile { .. } => Some(file_name),
            UploadDestination::ExistingFile { .. } => None,
        };
        preflight(client, destination, size, name).await?;
    }

    // 2. 上传地址
    let target = if options.upload_using_accelerator {
        resolve_upload_target(client, destination, size).await?
    } else {
        UploadTarget {
            default_url: destination.default_upload_url(client),
            accelerator_url: None,
        }
    };

    // 3. 表单
    let mut fields = Vec::with_capacity(2);
    if let Some(attributes) = attributes {
        fields.push(FormField::Text {
            name: "attributes".to_string(),
            value: attributes,
        });
    }
    fields.push(FormField::File {
        name: "file".to_string(),
        file_name: file_name.to_string(),
        length,
        stream,
    });

    info!(
        "上传文件内容: {:?}, url={}, size={:?}, etag={:?}",
        destination,
        target.url(),
        size,
        options.etag
    );

    let request = ApiRequest::post(target.url())
        .expect_json(false)
        .if_match(options.etag.as_deref())
        .multipart(fields);

    let response: UploadResponse = client.send(request).await?.json().await?;
    let entry = response
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| BoxError::InvalidResponse("上传响应中没有 entries".to_string()))?;

    info!("上传成功: id={}, etag={:?}", entry.id, entry.etag);
    Ok(entry)
}
