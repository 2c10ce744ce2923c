// 文件夹句柄（新建文件上传）

use super::file::File;
use super::item::{ItemInfo, ItemRef};
use super::upload::{self, UploadDestination, UploadOptions, UploadSource};
use super::ApiObject;
use crate::client::BoxClient;
use crate::error::{BoxError, Result};
use crate::session::{ApiRequest, ByteStream};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// 文件夹句柄
#[derive(Debug, Clone)]
pub struct Folder {
    client: BoxClient,
    info: ItemInfo,
}

/// 新建文件时的 attributes 字段
#[derive(Debug, Serialize)]
struct UploadAttributes<'a> {
    name: &'a str,
    parent: ItemRef,
}

impl Folder {
    pub(crate) fn new(client: BoxClient, folder_id: impl Into<String>) -> Self {
        Self {
            client,
            info: ItemInfo::new("folder", folder_id),
        }
    }

    pub fn from_info(client: BoxClient, info: ItemInfo) -> Self {
        Self { client, info }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn info(&self) -> &ItemInfo {
        &self.info
    }

    /// 获取文件夹信息
    pub async fn get(&self, fields: &[&str]) -> Result<Folder> {
        let url = self
            .client
            .api()
            .api_url(&format!("folders/{}", urlencoding::encode(self.id())));
        let mut request = ApiRequest::get(url);
        if !fields.is_empty() {
            request = request.param("fields", fields.join(","));
        }
        let info: ItemInfo = self.client.send(request).await?.json().await?;
        Ok(Folder::from_info(self.client.clone(), info))
    }

    /// 上传预检：确认在该文件夹下新建此文件是否会成功
    pub async fn preflight_check(&self, size: u64, name: &str) -> Result<()> {
        upload::preflight(
            &self.client,
            UploadDestination::NewFile { parent_id: self.id() },
            size,
            Some(name),
        )
        .await
    }

    /// 上传本地文件为新文件
    ///
    /// # 参数
    /// * `file_path` - 本地文件路径
    /// * `file_name` - 远端文件名（默认取本地文件名）
    /// * `options` - 上传选项（新建文件不支持 etag）
    pub async fn upload(
        &self,
        file_path: impl AsRef<Path>,
        file_name: Option<&str>,
        options: &UploadOptions,
    ) -> Result<File> {
        let path = file_path.as_ref();
        let name = match file_name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(String::from)
                .ok_or_else(|| {
                    BoxError::InvalidArgument(format!("无法从路径获取文件名: {:?}", path))
                })?,
        };
        self.upload_new_file(UploadSource::Path(path.to_path_buf()), &name, options)
            .await
    }

    /// 上传字节流为新文件
    pub async fn upload_stream(
        &self,
        file_stream: ByteStream,
        file_name: &str,
        options: &UploadOptions,
    ) -> Result<File> {
        self.upload_new_file(UploadSource::Stream(file_stream), file_name, options)
            .await
    }

    async fn upload_new_file(
        &self,
        source: UploadSource,
        file_name: &str,
        options: &UploadOptions,
    ) -> Result<File> {
        if options.etag.is_some() {
            return Err(BoxError::InvalidArgument("新建文件不支持 etag".to_string()));
        }
        if file_name.is_empty() {
            return Err(BoxError::InvalidArgument("文件名不能为空".to_string()));
        }

        let attributes = serde_json::to_string(&UploadAttributes {
            name: file_name,
            parent: ItemRef::folder(self.id()),
        })?;

        let info = upload::upload(
            &self.client,
            UploadDestination::NewFile { parent_id: self.id() },
            source,
            file_name,
            Some(attributes),
            options,
        )
        .await?;
        Ok(File::from_info(self.client.clone(), info))
    }
}

impl ApiObject for Folder {
    fn from_value(client: &BoxClient, value: Value) -> Result<Self> {
        Ok(Folder::from_info(client.clone(), serde_json::from_value(value)?))
    }
}
