// 文件句柄

use super::conditional::Conditional;
use super::item::{ItemInfo, ItemRef, SharedLinkInfo};
use super::pagination::{LimitOffsetPager, DEFAULT_PAGE_LIMIT};
use super::shared_link::{SharedLinkSettings, SharedLinkUpdate};
use super::task::Task;
use super::upload::{self, UploadDestination, UploadOptions, UploadSource, UNUSED_FILE_NAME};
use super::ApiObject;
use crate::client::BoxClient;
use crate::error::{BoxError, Result};
use crate::session::{ApiRequest, ByteStream};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// 文件句柄
///
/// 持有创建时的快照；更新类操作返回新的句柄，自身不变
#[derive(Debug, Clone)]
pub struct File {
    client: BoxClient,
    info: ItemInfo,
}

#[derive(Debug, Serialize)]
struct CreateTaskBody<'a> {
    item: ItemRef,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SharedLinkResponse {
    #[serde(default)]
    shared_link: Option<SharedLinkInfo>,
}

impl File {
    pub(crate) fn new(client: BoxClient, file_id: impl Into<String>) -> Self {
        Self {
            client,
            info: ItemInfo::new("file", file_id),
        }
    }

    /// 用已有快照创建句柄
    pub fn from_info(client: BoxClient, info: ItemInfo) -> Self {
        Self { client, info }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn info(&self) -> &ItemInfo {
        &self.info
    }

    /// 文件在标准 API 上的地址，可附加子路径（如 "content"）
    pub fn get_url(&self, sub: Option<&str>) -> String {
        let base = format!("files/{}", urlencoding::encode(&self.info.id));
        match sub {
            Some(sub) => self.client.api().api_url(&format!("{}/{}", base, sub)),
            None => self.client.api().api_url(&base),
        }
    }

    fn with_info(&self, info: ItemInfo) -> File {
        File {
            client: self.client.clone(),
            info,
        }
    }

    /// 获取文件信息
    ///
    /// # 参数
    /// * `fields` - 只返回这些字段（为空时返回默认字段）
    pub async fn get(&self, fields: &[&str]) -> Result<File> {
        let mut request = ApiRequest::get(self.get_url(None));
        if !fields.is_empty() {
            request = request.param("fields", fields.join(","));
        }
        let info: ItemInfo = self.client.send(request).await?.json().await?;
        Ok(self.with_info(info))
    }

    /// 更新文件信息（PUT 整体替换给出的字段）
    ///
    /// 提供 etag 时附加 If-Match，服务端版本不一致会返回 412
    pub async fn update_info<T: Serialize + ?Sized>(
        &self,
        data: &T,
        etag: Option<&str>,
    ) -> Result<File> {
        let request = ApiRequest::put(self.get_url(None))
            .json(data)?
            .if_match(etag);
        let info: ItemInfo = self.client.send(request).await?.json().await?;
        Ok(self.with_info(info))
    }

    /// 删除文件
    pub async fn delete(&self, etag: Option<&str>) -> Result<()> {
        info!("删除文件: id={}, etag={:?}", self.id(), etag);
        let request = ApiRequest::delete(self.get_url(None))
            .expect_json(false)
            .if_match(etag);
        self.client.send(request).await?;
        Ok(())
    }

    /// 下载文件内容，写入调用方提供的目标
    ///
    /// 中途断开时返回网络错误，目标中可能已写入部分数据
    ///
    /// # 返回
    /// 写入的字节数
    pub async fn download_to<W>(&self, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = self.get_url(Some("content"));
        info!("下载文件: id={}", self.id());

        let request = ApiRequest::get(url).expect_json(false).streaming();
        let mut body = self.client.send(request).await?.into_stream();

        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        debug!("下载完成: id={}, {} bytes", self.id(), written);
        Ok(written)
    }

    /// 读取完整文件内容
    pub async fn content(&self) -> Result<Vec<u8>> {
        let request = ApiRequest::get(self.get_url(Some("content"))).expect_json(false);
        self.client.send(request).await?.bytes().await
    }

    /// 上传预检：确认以该大小（和文件名）更新内容是否会成功
    pub async fn preflight_check(&self, size: u64, name: Option<&str>) -> Result<()> {
        upload::preflight(
            &self.client,
            UploadDestination::ExistingFile { file_id: self.id() },
            size,
            name,
        )
        .await
    }

    /// 用本地文件更新内容，返回新版本的句柄
    pub async fn update_contents(
        &self,
        file_path: impl AsRef<Path>,
        options: &UploadOptions,
    ) -> Result<File> {
        let source = UploadSource::Path(file_path.as_ref().to_path_buf());
        self.upload_new_version(source, options).await
    }

    /// 用字节流更新内容，返回新版本的句柄
    pub async fn update_contents_with_stream(
        &self,
        file_stream: ByteStream,
        options: &UploadOptions,
    ) -> Result<File> {
        self.upload_new_version(UploadSource::Stream(file_stream), options)
            .await
    }

    async fn upload_new_version(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<File> {
        let info = upload::upload(
            &self.client,
            UploadDestination::ExistingFile { file_id: self.id() },
            source,
            UNUSED_FILE_NAME,
            None,
            options,
        )
        .await?;
        Ok(self.with_info(info))
    }

    /// 加锁
    ///
    /// # 参数
    /// * `prevent_download` - 锁定期间是否禁止下载
    /// * `etag` - 期望的版本标记
    pub async fn lock(&self, prevent_download: bool, etag: Option<&str>) -> Result<File> {
        info!("文件加锁: id={}, prevent_download={}", self.id(), prevent_download);
        let data = json!({
            "lock": {
                "is_download_prevented": prevent_download,
                "type": "lock",
            }
        });
        self.update_info(&data, etag).await
    }

    /// 解锁
    pub async fn unlock(&self, etag: Option<&str>) -> Result<File> {
        info!("文件解锁: id={}", self.id());
        self.update_info(&json!({ "lock": null }), etag).await
    }

    async fn put_shared_link(
        &self,
        settings: Option<&SharedLinkSettings>,
        etag: Option<&str>,
    ) -> Result<SharedLinkResponse> {
        let body = SharedLinkUpdate {
            shared_link: settings,
        };
        let request = ApiRequest::put(self.get_url(None))
            .json(&body)?
            .if_match(etag);
        self.client.send(request).await?.json().await
    }

    /// 创建或更新共享链接，返回链接地址
    pub async fn get_shared_link(
        &self,
        settings: &SharedLinkSettings,
        etag: Option<&str>,
    ) -> Result<String> {
        let response = self.put_shared_link(Some(settings), etag).await?;
        response
            .shared_link
            .and_then(|link| link.url)
            .ok_or_else(|| BoxError::InvalidResponse("响应中没有 shared_link.url".to_string()))
    }

    /// 创建或更新共享链接，返回直接下载地址
    pub async fn get_shared_link_download_url(
        &self,
        settings: &SharedLinkSettings,
        etag: Option<&str>,
    ) -> Result<String> {
        let response = self.put_shared_link(Some(settings), etag).await?;
        response
            .shared_link
            .and_then(|link| link.download_url)
            .ok_or_else(|| {
                BoxError::InvalidResponse("响应中没有 shared_link.download_url".to_string())
            })
    }

    /// 删除共享链接
    pub async fn remove_shared_link(&self, etag: Option<&str>) -> Result<()> {
        let response = self.put_shared_link(None, etag).await?;
        debug!(
            "共享链接已删除: id={}, shared_link={:?}",
            self.id(),
            response.shared_link
        );
        Ok(())
    }

    /// 为文件创建审阅任务
    pub async fn create_task(
        &self,
        message: Option<&str>,
        due_at: Option<DateTime<Utc>>,
    ) -> Result<Task> {
        let body = CreateTaskBody {
            item: ItemRef::file(self.id()),
            action: "review",
            message,
            due_at: due_at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, false)),
        };
        info!("创建任务: file_id={}", self.id());

        let request = ApiRequest::post(self.client.api().api_url("tasks")).json(&body)?;
        let value: Value = self.client.send(request).await?.json().await?;
        Task::from_value(&self.client, value)
    }

    /// 文件上的任务（分页迭代）
    pub fn tasks(&self, limit: Option<u32>) -> LimitOffsetPager<Task> {
        LimitOffsetPager::new(
            self.client.clone(),
            self.get_url(Some("tasks")),
            limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        )
    }
}

impl ApiObject for File {
    fn from_value(client: &BoxClient, value: Value) -> Result<Self> {
        Ok(File::from_info(client.clone(), serde_json::from_value(value)?))
    }
}
