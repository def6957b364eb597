//! 命令构造器
//!
//! [`AtApi`] 按操作暴露一个方法，内部统一走 [`AtApi::render`]：
//! 参数校验 + 模板前缀拼接。渲染结果即线上命令本体，**不含**行结束符，
//! CRLF 由串口会话在发送时追加。
//!
//! 参数规则：
//! - 逗号是多参数命令的字段分隔符，线上格式没有转义机制，
//!   因此任何参数含逗号一律拒绝（所有操作统一处理，不会部分拼接）。
//! - 参数含 CR/LF 同样拒绝，保证渲染结果永不夹带行结束符。
//! - 枚举型参数（接口 / 改正源 / 改正模块 / 设备模式 / NVS 模式）
//!   限定在固定集合内，集合外取值返回 [`ApiError::InvalidParameter`]。

use crate::error::ApiError;
use crate::params::{CorrectionModule, CorrectionSource, DeviceMode, NetInterface, NvsConfigMode};
use crate::template::TemplateStore;

/// 字段分隔符（线上格式，无转义）
const FIELD_SEPARATOR: char = ',';

/// AT 命令构造器
///
/// 持有不可变的模板存储，所有方法均为纯函数：校验失败返回类型化错误，
/// 成功返回可发送的命令字符串。
pub struct AtApi {
    templates: TemplateStore,
}

impl AtApi {
    /// 创建命令构造器
    pub fn new(templates: TemplateStore) -> Self {
        Self { templates }
    }

    /// 校验单个参数
    ///
    /// 拒绝逗号（字段分隔符，无转义）与 CR/LF（行结束符不变量）。
    fn check_param(field: &str, value: &str) -> Result<(), ApiError> {
        if value.contains(FIELD_SEPARATOR) {
            return Err(ApiError::invalid_param(
                field,
                "contains `,` which is the field separator and cannot be escaped",
            ));
        }
        if value.contains('\r') || value.contains('\n') {
            return Err(ApiError::invalid_param(
                field,
                "contains a line terminator",
            ));
        }
        Ok(())
    }

    /// 渲染命令：`prefix + params.join(",")`
    ///
    /// 所有参数先整体校验再拼接，校验失败时不产生任何输出。
    fn render(
        &self,
        category: &str,
        operation: &str,
        params: &[(&str, &str)],
    ) -> Result<String, ApiError> {
        let prefix = self.templates.lookup(category, operation)?;
        for (field, value) in params {
            Self::check_param(field, value)?;
        }
        let mut cmd = String::from(prefix);
        for (i, (_, value)) in params.iter().enumerate() {
            if i > 0 {
                cmd.push(FIELD_SEPARATOR);
            }
            cmd.push_str(value);
        }
        Ok(cmd)
    }

    // === Wi-Fi ===

    /// 设置 Wi-Fi 凭据
    pub fn wifi_set(&self, ssid: &str, password: &str) -> Result<String, ApiError> {
        self.render("wifi", "set", &[("ssid", ssid), ("password", password)])
    }

    /// 查询 Wi-Fi 凭据
    pub fn wifi_get(&self) -> Result<String, ApiError> {
        self.render("wifi", "get", &[])
    }

    /// 删除 Wi-Fi 凭据
    pub fn wifi_delete(&self) -> Result<String, ApiError> {
        self.render("wifi", "delete", &[])
    }

    // === APN ===

    /// 设置蜂窝 APN
    pub fn apn_set(&self, apn: &str) -> Result<String, ApiError> {
        self.render("apn", "set", &[("apn", apn)])
    }

    /// 查询蜂窝 APN
    pub fn apn_get(&self) -> Result<String, ApiError> {
        self.render("apn", "get", &[])
    }

    /// 删除蜂窝 APN
    pub fn apn_delete(&self) -> Result<String, ApiError> {
        self.render("apn", "delete", &[])
    }

    // === Thingstream ===

    /// 设置 Thingstream broker 地址
    pub fn thingstream_broker_set(&self, broker: &str, port: &str) -> Result<String, ApiError> {
        self.render(
            "thingstream",
            "brokerSet",
            &[("broker", broker), ("port", port)],
        )
    }

    /// 查询 Thingstream broker 地址
    pub fn thingstream_broker_get(&self) -> Result<String, ApiError> {
        self.render("thingstream", "brokerGet", &[])
    }

    /// 删除 Thingstream broker 地址
    pub fn thingstream_broker_delete(&self) -> Result<String, ApiError> {
        self.render("thingstream", "brokerDelete", &[])
    }

    /// 设置 Thingstream client ID
    pub fn thingstream_client_id_set(&self, client_id: &str) -> Result<String, ApiError> {
        self.render("thingstream", "clientIdSet", &[("client_id", client_id)])
    }

    /// 查询 Thingstream client ID
    pub fn thingstream_client_id_get(&self) -> Result<String, ApiError> {
        self.render("thingstream", "clientIdGet", &[])
    }

    /// 删除 Thingstream client ID
    pub fn thingstream_client_id_delete(&self) -> Result<String, ApiError> {
        self.render("thingstream", "clientIdDelete", &[])
    }

    /// 设置 Thingstream 证书（不得含 CR/LF）
    pub fn thingstream_certificate_set(&self, cert: &str) -> Result<String, ApiError> {
        self.render("thingstream", "certSet", &[("cert", cert)])
    }

    /// 查询 Thingstream 证书
    pub fn thingstream_certificate_get(&self) -> Result<String, ApiError> {
        self.render("thingstream", "certGet", &[])
    }

    /// 删除 Thingstream 证书
    pub fn thingstream_certificate_delete(&self) -> Result<String, ApiError> {
        self.render("thingstream", "certDelete", &[])
    }

    /// 设置 Thingstream key（不得含 CR/LF）
    pub fn thingstream_key_set(&self, key: &str) -> Result<String, ApiError> {
        self.render("thingstream", "keySet", &[("key", key)])
    }

    /// 查询 Thingstream key
    pub fn thingstream_key_get(&self) -> Result<String, ApiError> {
        self.render("thingstream", "keyGet", &[])
    }

    /// 删除 Thingstream key
    pub fn thingstream_key_delete(&self) -> Result<String, ApiError> {
        self.render("thingstream", "keyDelete", &[])
    }

    /// 设置 Thingstream root CA（不得含 CR/LF）
    pub fn thingstream_root_ca_set(&self, root_ca: &str) -> Result<String, ApiError> {
        self.render("thingstream", "rootCaSet", &[("root_ca", root_ca)])
    }

    /// 查询 Thingstream root CA
    pub fn thingstream_root_ca_get(&self) -> Result<String, ApiError> {
        self.render("thingstream", "rootCaGet", &[])
    }

    /// 删除 Thingstream root CA
    pub fn thingstream_root_ca_delete(&self) -> Result<String, ApiError> {
        self.render("thingstream", "rootCaDelete", &[])
    }

    /// 设置 Thingstream 区域
    ///
    /// 设备侧接受 "eu" / "us" / "kr" / "jp" / "au"，本层不做集合校验
    /// （与设备固件保持一致，由设备侧拒绝未知区域）。
    pub fn thingstream_region_set(&self, region: &str) -> Result<String, ApiError> {
        self.render("thingstream", "regionSet", &[("region", region)])
    }

    /// 查询 Thingstream 区域
    pub fn thingstream_region_get(&self) -> Result<String, ApiError> {
        self.render("thingstream", "regionGet", &[])
    }

    /// 删除 Thingstream 区域
    pub fn thingstream_region_delete(&self) -> Result<String, ApiError> {
        self.render("thingstream", "regionDelete", &[])
    }

    /// 设置 Thingstream 订阅计划
    ///
    /// 设备侧接受 "ip" / "ip+lband" / "lband"，本层不做集合校验。
    pub fn thingstream_plan_set(&self, plan: &str) -> Result<String, ApiError> {
        self.render("thingstream", "planSet", &[("plan", plan)])
    }

    /// 查询 Thingstream 订阅计划
    pub fn thingstream_plan_get(&self) -> Result<String, ApiError> {
        self.render("thingstream", "planGet", &[])
    }

    /// 删除 Thingstream 订阅计划
    pub fn thingstream_plan_delete(&self) -> Result<String, ApiError> {
        self.render("thingstream", "planDelete", &[])
    }

    // === NTRIP ===

    /// 设置 NTRIP 服务器地址
    pub fn ntrip_server_set(&self, server: &str, port: &str) -> Result<String, ApiError> {
        self.render("ntrip", "serverSet", &[("server", server), ("port", port)])
    }

    /// 查询 NTRIP 服务器地址
    pub fn ntrip_server_get(&self) -> Result<String, ApiError> {
        self.render("ntrip", "serverGet", &[])
    }

    /// 删除 NTRIP 服务器地址
    pub fn ntrip_server_delete(&self) -> Result<String, ApiError> {
        self.render("ntrip", "serverDelete", &[])
    }

    /// 设置 NTRIP user agent
    pub fn ntrip_user_agent_set(&self, user_agent: &str) -> Result<String, ApiError> {
        self.render("ntrip", "userAgentSet", &[("user_agent", user_agent)])
    }

    /// 查询 NTRIP user agent
    pub fn ntrip_user_agent_get(&self) -> Result<String, ApiError> {
        self.render("ntrip", "userAgentGet", &[])
    }

    /// 删除 NTRIP user agent
    pub fn ntrip_user_agent_delete(&self) -> Result<String, ApiError> {
        self.render("ntrip", "userAgentDelete", &[])
    }

    /// 设置 NTRIP mount point
    pub fn ntrip_mount_point_set(&self, mount_point: &str) -> Result<String, ApiError> {
        self.render("ntrip", "mountPointSet", &[("mount_point", mount_point)])
    }

    /// 查询 NTRIP mount point
    pub fn ntrip_mount_point_get(&self) -> Result<String, ApiError> {
        self.render("ntrip", "mountPointGet", &[])
    }

    /// 删除 NTRIP mount point
    pub fn ntrip_mount_point_delete(&self) -> Result<String, ApiError> {
        self.render("ntrip", "mountPointDelete", &[])
    }

    /// 设置 NTRIP 凭据
    pub fn ntrip_credentials_set(&self, username: &str, password: &str) -> Result<String, ApiError> {
        self.render(
            "ntrip",
            "credsSet",
            &[("username", username), ("password", password)],
        )
    }

    /// 查询 NTRIP 凭据
    pub fn ntrip_credentials_get(&self) -> Result<String, ApiError> {
        self.render("ntrip", "credsGet", &[])
    }

    /// 删除 NTRIP 凭据
    pub fn ntrip_credentials_delete(&self) -> Result<String, ApiError> {
        self.render("ntrip", "credsDelete", &[])
    }

    /// 设置 NTRIP GGA relay 选项
    pub fn ntrip_gga_relay_set(&self, gga_relay: &str) -> Result<String, ApiError> {
        self.render("ntrip", "ggaRelaySet", &[("gga_relay", gga_relay)])
    }

    /// 查询 NTRIP GGA relay 选项
    pub fn ntrip_gga_relay_get(&self) -> Result<String, ApiError> {
        self.render("ntrip", "ggaRelayGet", &[])
    }

    // === 状态查询 ===

    /// 查询 Wi-Fi 状态
    pub fn status_wifi(&self) -> Result<String, ApiError> {
        self.render("status", "wifi", &[])
    }

    /// 查询蜂窝状态
    pub fn status_cell(&self) -> Result<String, ApiError> {
        self.render("status", "cell", &[])
    }

    /// 查询 Thingstream 状态
    pub fn status_thingstream(&self) -> Result<String, ApiError> {
        self.render("status", "thingstream", &[])
    }

    /// 查询 NTRIP 状态
    pub fn status_ntrip(&self) -> Result<String, ApiError> {
        self.render("status", "ntrip", &[])
    }

    /// 查询 GNSS 状态
    pub fn status_gnss(&self) -> Result<String, ApiError> {
        self.render("status", "gnss", &[])
    }

    // === 杂项 ===

    /// 设置 GNSS 航位推算（dead reckoning）选项
    pub fn misc_dead_reckoning_set(&self, enable: &str) -> Result<String, ApiError> {
        self.render("misc", "gnssDrSet", &[("enable", enable)])
    }

    /// 查询 GNSS 航位推算选项
    pub fn misc_dead_reckoning_get(&self) -> Result<String, ApiError> {
        self.render("misc", "gnssDrGet", &[])
    }

    /// 设置 SD 卡日志选项
    pub fn misc_sd_log_set(&self, enable: &str) -> Result<String, ApiError> {
        self.render("misc", "sdLogSet", &[("enable", enable)])
    }

    /// 查询 SD 卡日志选项
    pub fn misc_sd_log_get(&self) -> Result<String, ApiError> {
        self.render("misc", "sdLogGet", &[])
    }

    /// 设置通信接口
    ///
    /// # 错误
    /// - `ApiError::InvalidParameter`: 取值不在 {wi-fi, cell}
    pub fn misc_interface_set(&self, interface: &str) -> Result<String, ApiError> {
        let iface: NetInterface = interface.parse()?;
        self.render("misc", "interfaceSet", &[("interface", iface.as_str())])
    }

    /// 查询通信接口
    pub fn misc_interface_get(&self) -> Result<String, ApiError> {
        self.render("misc", "interfaceGet", &[])
    }

    /// 设置差分改正数据来源
    ///
    /// # 错误
    /// - `ApiError::InvalidParameter`: 取值不在 {ts, ntrip}
    pub fn misc_correction_source_set(&self, source: &str) -> Result<String, ApiError> {
        let source: CorrectionSource = source.parse()?;
        self.render(
            "misc",
            "correctionSourceSet",
            &[("correction_source", source.as_str())],
        )
    }

    /// 查询差分改正数据来源
    pub fn misc_correction_source_get(&self) -> Result<String, ApiError> {
        self.render("misc", "correctionSourceGet", &[])
    }

    /// 设置差分改正接收模块
    ///
    /// # 错误
    /// - `ApiError::InvalidParameter`: 取值不在 {ip, lband}
    pub fn misc_correction_module_set(&self, module: &str) -> Result<String, ApiError> {
        let module: CorrectionModule = module.parse()?;
        self.render(
            "misc",
            "correctionModuleSet",
            &[("correction_module", module.as_str())],
        )
    }

    /// 查询差分改正接收模块
    pub fn misc_correction_module_get(&self) -> Result<String, ApiError> {
        self.render("misc", "correctionModuleGet", &[])
    }

    /// 设置开机自启（"0" / "1"）
    pub fn misc_auto_start_set(&self, auto_start: &str) -> Result<String, ApiError> {
        self.render("misc", "autoStartSet", &[("auto_start", auto_start)])
    }

    /// 查询开机自启
    pub fn misc_auto_start_get(&self) -> Result<String, ApiError> {
        self.render("misc", "autoStartGet", &[])
    }

    /// 设置 NVS 配置模式
    ///
    /// # 错误
    /// - `ApiError::InvalidParameter`: 取值不在 {MANUAL, AUTO, SAVE}
    pub fn misc_nvs_config_set(&self, mode: &str) -> Result<String, ApiError> {
        let mode: NvsConfigMode = mode.parse()?;
        self.render("misc", "nvsConfigSet", &[("nvs_mode", mode.as_str())])
    }

    /// 查询 NVS 配置模式
    pub fn misc_nvs_config_get(&self) -> Result<String, ApiError> {
        self.render("misc", "nvsConfigGet", &[])
    }

    /// 设置 UART 波特率
    pub fn misc_baudrate_set(&self, baudrate: &str) -> Result<String, ApiError> {
        self.render("misc", "baudrateSet", &[("baudrate", baudrate)])
    }

    /// 查询 UART 波特率
    pub fn misc_baudrate_get(&self) -> Result<String, ApiError> {
        self.render("misc", "baudrateGet", &[])
    }

    /// 设置设备运行模式
    ///
    /// # 错误
    /// - `ApiError::InvalidParameter`: 取值不在 {config, start, stop}
    pub fn misc_device_mode_set(&self, mode: &str) -> Result<String, ApiError> {
        let mode: DeviceMode = mode.parse()?;
        self.render("misc", "dvcModeSet", &[("mode", mode.as_str())])
    }

    /// 查询设备运行模式
    pub fn misc_device_mode_get(&self) -> Result<String, ApiError> {
        self.render("misc", "dvcModeGet", &[])
    }

    /// 查询板卡信息
    pub fn misc_device_info_get(&self) -> Result<String, ApiError> {
        self.render("misc", "boardInfo", &[])
    }

    /// 重启设备
    pub fn misc_restart_device(&self) -> Result<String, ApiError> {
        self.render("misc", "dvcRestart", &[])
    }

    /// 探测设备
    pub fn misc_check_device(&self) -> Result<String, ApiError> {
        self.render("misc", "dvcCheck", &[])
    }

    /// 恢复出厂设置
    pub fn misc_factory_reset(&self) -> Result<String, ApiError> {
        self.render("misc", "factoryReset", &[])
    }

    /// 查询定位数据
    pub fn misc_location_get(&self) -> Result<String, ApiError> {
        self.render("misc", "location", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateStore;

    fn api() -> AtApi {
        let json = r#"{
            "wifi": [{ "set": "AT+WIFI=", "get": "AT+WIFI=?", "delete": "AT+ERASE=WIFI" }],
            "apn": [{ "set": "AT+APN=", "get": "AT+APN=?", "delete": "AT+ERASE=APN" }],
            "thingstream": [{
                "brokerSet": "AT+TSBROKER=", "brokerGet": "AT+TSBROKER=?",
                "clientIdSet": "AT+TSID=", "regionSet": "AT+TSREGION=",
                "planSet": "AT+TSPLAN="
            }],
            "ntrip": [{
                "serverSet": "AT+NTRIPSRV=", "credsSet": "AT+NTRIPCREDS=",
                "ggaRelaySet": "AT+NTRIPGGA="
            }],
            "status": [{ "gnss": "AT+STATGNSS=?" }],
            "misc": [{
                "interfaceSet": "AT+IF=", "correctionSourceSet": "AT+CORSRC=",
                "correctionModuleSet": "AT+CORMOD=", "dvcModeSet": "AT+HPGMODE=",
                "nvsConfigSet": "AT+NVSCONFIG=", "baudrateSet": "AT+BAUD=",
                "boardInfo": "AT+BRDNFO=?", "dvcRestart": "AT+BRD=RST",
                "factoryReset": "AT+ERASE=ALL"
            }]
        }"#;
        AtApi::new(TemplateStore::from_json_str(json).unwrap())
    }

    /// 单参数命令：渲染结果 = 模板前缀 + 参数
    #[test]
    fn test_single_param_render_identity() {
        let api = api();
        assert_eq!(api.apn_set("internet").unwrap(), "AT+APN=internet");
        assert_eq!(
            api.thingstream_client_id_set("device-42").unwrap(),
            "AT+TSID=device-42"
        );
        assert_eq!(api.misc_baudrate_set("115200").unwrap(), "AT+BAUD=115200");
    }

    /// 多参数命令：按声明顺序以单个逗号连接，无尾分隔符
    #[test]
    fn test_multi_param_join_order() {
        let api = api();
        assert_eq!(
            api.wifi_set("homeNet", "secret1").unwrap(),
            "AT+WIFI=homeNet,secret1"
        );
        assert_eq!(
            api.thingstream_broker_set("mqtt.example.com", "8883").unwrap(),
            "AT+TSBROKER=mqtt.example.com,8883"
        );
        assert_eq!(
            api.ntrip_credentials_set("user", "pass").unwrap(),
            "AT+NTRIPCREDS=user,pass"
        );
    }

    /// 无参数命令：模板原样输出
    #[test]
    fn test_no_param_render_verbatim() {
        let api = api();
        assert_eq!(api.wifi_get().unwrap(), "AT+WIFI=?");
        assert_eq!(api.wifi_delete().unwrap(), "AT+ERASE=WIFI");
        assert_eq!(api.misc_device_info_get().unwrap(), "AT+BRDNFO=?");
        assert_eq!(api.misc_restart_device().unwrap(), "AT+BRD=RST");
        assert_eq!(api.misc_factory_reset().unwrap(), "AT+ERASE=ALL");
        assert_eq!(api.status_gnss().unwrap(), "AT+STATGNSS=?");
    }

    /// 含逗号的参数在所有操作上统一拒绝，不产生部分输出
    #[test]
    fn test_comma_rejected_everywhere() {
        let api = api();
        assert!(matches!(
            api.wifi_set("homeNet", "sec,ret").unwrap_err(),
            ApiError::InvalidParameter { field, .. } if field == "password"
        ));
        assert!(api.apn_set("a,b").is_err());
        assert!(api.thingstream_broker_set("host", "88,83").is_err());
        assert!(api.ntrip_credentials_set("us,er", "pass").is_err());
        assert!(api.thingstream_region_set("eu,us").is_err());
    }

    /// 含行结束符的参数拒绝（渲染结果不得夹带终结符）
    #[test]
    fn test_line_terminator_rejected() {
        let api = api();
        assert!(api.apn_set("inter\r\nnet").is_err());
        assert!(api.wifi_set("ssid\n", "pass").is_err());
    }

    /// 枚举集合：集合内成员全部接受，集合外一律拒绝
    #[test]
    fn test_enumerated_sets() {
        let api = api();
        assert_eq!(api.misc_interface_set("wi-fi").unwrap(), "AT+IF=wi-fi");
        assert_eq!(api.misc_interface_set("cell").unwrap(), "AT+IF=cell");
        assert!(api.misc_interface_set("ethernet").is_err());

        assert_eq!(api.misc_correction_source_set("ts").unwrap(), "AT+CORSRC=ts");
        assert_eq!(
            api.misc_correction_source_set("ntrip").unwrap(),
            "AT+CORSRC=ntrip"
        );
        assert!(api.misc_correction_source_set("rtk").is_err());

        assert_eq!(api.misc_correction_module_set("ip").unwrap(), "AT+CORMOD=ip");
        assert_eq!(
            api.misc_correction_module_set("lband").unwrap(),
            "AT+CORMOD=lband"
        );
        assert!(api.misc_correction_module_set("uhf").is_err());

        for mode in ["config", "start", "stop"] {
            assert_eq!(
                api.misc_device_mode_set(mode).unwrap(),
                format!("AT+HPGMODE={mode}")
            );
        }
        // 集合外的设备模式拒绝
        assert!(matches!(
            api.misc_device_mode_set("paused").unwrap_err(),
            ApiError::InvalidParameter { .. }
        ));

        for mode in ["MANUAL", "AUTO", "SAVE"] {
            assert_eq!(
                api.misc_nvs_config_set(mode).unwrap(),
                format!("AT+NVSCONFIG={mode}")
            );
        }
        assert!(api.misc_nvs_config_set("manual").is_err());
    }

    /// 区域 / 计划不做集合校验（与设备固件一致），但仍受逗号规则约束
    #[test]
    fn test_region_and_plan_passthrough() {
        let api = api();
        assert_eq!(api.thingstream_region_set("eu").unwrap(), "AT+TSREGION=eu");
        assert_eq!(
            api.thingstream_plan_set("ip+lband").unwrap(),
            "AT+TSPLAN=ip+lband"
        );
    }

    /// 未配置的模板键是硬错误
    #[test]
    fn test_unknown_template_key() {
        let api = api();
        // 测试模板故意缺少 misc.location
        assert!(matches!(
            api.misc_location_get().unwrap_err(),
            ApiError::UnknownOperation { .. }
        ));
    }
}
