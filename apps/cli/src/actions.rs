//! 菜单动作：命令构造 + 发送，以及"从文件批量配置"流程
//!
//! 所有路径共用 [`Actions::dispatch`]：构造失败（参数校验不通过）
//! 在此就地报告，**不会**有任何字节上线；构造成功则发送，发送失败
//! 同样就地报告（连接状态已由会话层切回断开）。
//!
//! 批量配置沿用设备侧要求：每项设置前先 `AT+HPGMODE=config`，
//! 命令之间固定间隔（默认 2 s）给设备留出处理时间。

use crate::config::DeviceConfig;
use hpgat_api::{ApiError, AtApi};
use hpgat_session::SerialSession;
use std::time::Duration;
use tracing::debug;

/// 批量配置时命令之间的固定间隔
const PACING_INTERVAL: Duration = Duration::from_secs(2);

/// 菜单动作集合
pub struct Actions<'a> {
    api: &'a AtApi,
    session: &'a SerialSession,
    config: &'a DeviceConfig,
    pacing: Duration,
}

impl<'a> Actions<'a> {
    pub fn new(api: &'a AtApi, session: &'a SerialSession, config: &'a DeviceConfig) -> Self {
        Self {
            api,
            session,
            config,
            pacing: PACING_INTERVAL,
        }
    }

    /// 命令构造器（菜单的"读取单项"入口直接走构造 + dispatch）
    pub fn api(&self) -> &AtApi {
        self.api
    }

    /// 构造结果统一出口：校验失败或发送失败都就地报告
    pub fn dispatch(&self, built: Result<String, ApiError>) {
        match built {
            Ok(cmd) => {
                println!("sending: {cmd}");
                if let Err(e) = self.session.transmit(&cmd) {
                    println!("transmit error: {e}");
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    fn pace(&self) {
        std::thread::sleep(self.pacing);
    }

    /// 批量设置的前置步骤：进入配置模式
    fn enter_config_mode(&self) {
        self.dispatch(self.api.misc_device_mode_set("config"));
        self.pace();
    }

    fn missing(section: &str) {
        println!("config file has no `{section}` section, nothing to apply");
    }

    // === 设备设置（settings 段） ===

    pub fn device_apply_interface(&self) {
        let Some(s) = self.config.settings() else {
            return Self::missing("settings");
        };
        self.enter_config_mode();
        self.dispatch(self.api.misc_interface_set(&s.interface));
        self.pace();
    }

    pub fn device_apply_wifi(&self) {
        let Some(s) = self.config.settings() else {
            return Self::missing("settings");
        };
        self.enter_config_mode();
        self.dispatch(self.api.wifi_set(&s.ssid, &s.password));
        self.pace();
    }

    pub fn device_apply_apn(&self) {
        let Some(s) = self.config.settings() else {
            return Self::missing("settings");
        };
        self.enter_config_mode();
        self.dispatch(self.api.apn_set(&s.apn));
        self.pace();
    }

    pub fn device_apply_correction_source(&self) {
        let Some(s) = self.config.settings() else {
            return Self::missing("settings");
        };
        self.enter_config_mode();
        self.dispatch(self.api.misc_correction_source_set(&s.correction_source));
        self.pace();
    }

    pub fn device_apply_correction_module(&self) {
        let Some(s) = self.config.settings() else {
            return Self::missing("settings");
        };
        self.enter_config_mode();
        self.dispatch(self.api.misc_correction_module_set(&s.correction_module));
        self.pace();
    }

    pub fn device_apply_dead_reckoning(&self) {
        let Some(s) = self.config.settings() else {
            return Self::missing("settings");
        };
        self.enter_config_mode();
        self.dispatch(self.api.misc_dead_reckoning_set(&s.gnss_dr));
        self.pace();
    }

    pub fn device_apply_sd_log(&self) {
        let Some(s) = self.config.settings() else {
            return Self::missing("settings");
        };
        self.enter_config_mode();
        self.dispatch(self.api.misc_sd_log_set(&s.sd_log));
        self.pace();
    }

    /// 从文件套用全部设备设置
    pub fn device_apply_all(&self) {
        debug!("applying device settings from config file");
        self.device_apply_interface();
        self.device_apply_wifi();
        self.device_apply_apn();
        self.device_apply_correction_source();
        self.device_apply_correction_module();
        self.device_apply_dead_reckoning();
        self.device_apply_sd_log();
    }

    /// 逐项读取设备当前设置
    pub fn device_read_all(&self) {
        for built in [
            self.api.misc_interface_get(),
            self.api.wifi_get(),
            self.api.apn_get(),
            self.api.misc_correction_source_get(),
            self.api.misc_correction_module_get(),
            self.api.misc_dead_reckoning_get(),
            self.api.misc_sd_log_get(),
        ] {
            self.dispatch(built);
            self.pace();
        }
    }

    // === Thingstream 设置（thingstream 段） ===

    pub fn ts_apply_broker(&self) {
        let Some(ts) = self.config.thingstream() else {
            return Self::missing("thingstream");
        };
        self.enter_config_mode();
        self.dispatch(self.api.thingstream_broker_set(&ts.broker, &ts.port));
        self.pace();
    }

    pub fn ts_apply_client_id(&self) {
        let Some(ts) = self.config.thingstream() else {
            return Self::missing("thingstream");
        };
        self.enter_config_mode();
        self.dispatch(self.api.thingstream_client_id_set(&ts.client_id));
        self.pace();
    }

    pub fn ts_apply_certificate(&self) {
        let Some(ts) = self.config.thingstream() else {
            return Self::missing("thingstream");
        };
        self.enter_config_mode();
        self.dispatch(self.api.thingstream_certificate_set(&ts.cert));
        self.pace();
    }

    pub fn ts_apply_key(&self) {
        let Some(ts) = self.config.thingstream() else {
            return Self::missing("thingstream");
        };
        self.enter_config_mode();
        self.dispatch(self.api.thingstream_key_set(&ts.key));
        self.pace();
    }

    pub fn ts_apply_root_ca(&self) {
        let Some(ts) = self.config.thingstream() else {
            return Self::missing("thingstream");
        };
        self.enter_config_mode();
        self.dispatch(self.api.thingstream_root_ca_set(&ts.root_ca));
        self.pace();
    }

    pub fn ts_apply_region(&self) {
        let Some(ts) = self.config.thingstream() else {
            return Self::missing("thingstream");
        };
        self.enter_config_mode();
        self.dispatch(self.api.thingstream_region_set(&ts.region));
        self.pace();
    }

    pub fn ts_apply_plan(&self) {
        let Some(ts) = self.config.thingstream() else {
            return Self::missing("thingstream");
        };
        self.enter_config_mode();
        self.dispatch(self.api.thingstream_plan_set(&ts.plan));
        self.pace();
    }

    /// 从文件套用全部 Thingstream 设置
    pub fn ts_apply_all(&self) {
        debug!("applying thingstream settings from config file");
        self.ts_apply_broker();
        self.ts_apply_client_id();
        self.ts_apply_key();
        self.ts_apply_certificate();
        self.ts_apply_root_ca();
        self.ts_apply_plan();
        self.ts_apply_region();
    }

    /// 逐项读取 Thingstream 当前设置
    pub fn ts_read_all(&self) {
        for built in [
            self.api.thingstream_broker_get(),
            self.api.thingstream_client_id_get(),
            self.api.thingstream_key_get(),
            self.api.thingstream_certificate_get(),
            self.api.thingstream_root_ca_get(),
            self.api.thingstream_plan_get(),
            self.api.thingstream_region_get(),
        ] {
            self.dispatch(built);
            self.pace();
        }
    }

    // === NTRIP 设置（ntrip 段） ===

    pub fn ntrip_apply_server(&self) {
        let Some(n) = self.config.ntrip() else {
            return Self::missing("ntrip");
        };
        self.enter_config_mode();
        self.dispatch(self.api.ntrip_server_set(&n.server, &n.port));
        self.pace();
    }

    pub fn ntrip_apply_user_agent(&self) {
        let Some(n) = self.config.ntrip() else {
            return Self::missing("ntrip");
        };
        self.enter_config_mode();
        self.dispatch(self.api.ntrip_user_agent_set(&n.user_agent));
        self.pace();
    }

    pub fn ntrip_apply_mount_point(&self) {
        let Some(n) = self.config.ntrip() else {
            return Self::missing("ntrip");
        };
        self.enter_config_mode();
        self.dispatch(self.api.ntrip_mount_point_set(&n.mount_point));
        self.pace();
    }

    pub fn ntrip_apply_credentials(&self) {
        let Some(n) = self.config.ntrip() else {
            return Self::missing("ntrip");
        };
        self.enter_config_mode();
        self.dispatch(self.api.ntrip_credentials_set(&n.username, &n.password));
        self.pace();
    }

    pub fn ntrip_apply_gga_relay(&self) {
        let Some(n) = self.config.ntrip() else {
            return Self::missing("ntrip");
        };
        self.enter_config_mode();
        self.dispatch(self.api.ntrip_gga_relay_set(&n.gga_relay));
        self.pace();
    }

    /// 从文件套用全部 NTRIP 设置
    pub fn ntrip_apply_all(&self) {
        debug!("applying ntrip settings from config file");
        self.ntrip_apply_server();
        self.ntrip_apply_user_agent();
        self.ntrip_apply_mount_point();
        self.ntrip_apply_credentials();
        self.ntrip_apply_gga_relay();
    }

    /// 逐项读取 NTRIP 当前设置
    pub fn ntrip_read_all(&self) {
        for built in [
            self.api.ntrip_server_get(),
            self.api.ntrip_user_agent_get(),
            self.api.ntrip_mount_point_get(),
            self.api.ntrip_credentials_get(),
            self.api.ntrip_gga_relay_get(),
        ] {
            self.dispatch(built);
            self.pace();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpgat_api::TemplateStore;
    use hpgat_serial::mock::MockBackend;
    use hpgat_session::{PersistError, ResponseSink, SessionConfig};
    use std::sync::Arc;
    use std::time::Duration;

    struct NullSink;

    impl ResponseSink for NullSink {
        fn record(&self, _channel: &str, _line: &str) -> Result<(), PersistError> {
            Ok(())
        }
    }

    /// 断开状态下 dispatch 立即返回（菜单不因链路断开而挂起），
    /// 且没有任何字节上线
    #[test]
    fn test_dispatch_fails_fast_when_disconnected() {
        let api = AtApi::new(
            TemplateStore::from_json_str(r#"{ "wifi": [{ "get": "AT+WIFI=?" }] }"#).unwrap(),
        );
        let config: DeviceConfig = serde_json::from_str(
            r#"{ "devices": [
                { "description": "dvc1", "serialport": "mock0", "baudrate": 115200, "timeout": 0.005 }
            ] }"#,
        )
        .unwrap();

        let backend = MockBackend::new();
        let handle = backend.handle();
        handle.set_fail_connect(true);

        let session = SerialSession::start(
            "dvc1",
            SessionConfig {
                port: "mock0".to_string(),
                baud_rate: 115_200,
                timeout: Duration::from_millis(5),
                retry_interval: Duration::from_millis(1),
            },
            Arc::new(backend),
            Arc::new(NullSink),
        );

        let actions = Actions::new(&api, &session, &config);
        actions.dispatch(api.wifi_get());

        assert!(!session.is_connected());
        assert!(handle.written().is_empty());
    }
}
