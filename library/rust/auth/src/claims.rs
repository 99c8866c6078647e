//! JWT Claims 構造体。

use std::collections::HashSet;

use serde::Deserialize;

/// Claims は検証済み Bearer トークンの Claims 構造体を表す。
///
/// ロールクレームは IdP によって単一文字列と文字列配列のどちらでも
/// 発行されるため、[`Roles`] でデシリアライズ時に正規化する。
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// 主体の一意識別子
    pub sub: String,

    /// トークン発行者
    pub iss: String,

    /// トークンの対象オーディエンス
    #[serde(default)]
    pub aud: Audience,

    /// トークンの有効期限（Unix タイムスタンプ）
    pub exp: u64,

    /// トークンの有効開始時刻（Unix タイムスタンプ）
    #[serde(default)]
    pub nbf: Option<u64>,

    /// トークンの発行時刻（Unix タイムスタンプ）
    #[serde(default)]
    pub iat: Option<u64>,

    /// メールアドレス
    #[serde(default)]
    pub email: Option<String>,

    /// 表示用ユーザー名
    #[serde(default)]
    pub preferred_username: Option<String>,

    /// ロール一覧（"roles" または単数形 "role" クレーム）
    #[serde(default, alias = "role")]
    pub roles: Roles,
}

/// Audience は JWT の aud Claim を表す。
/// 文字列または文字列配列のどちらも受け付ける。
#[derive(Debug, Clone, Default)]
pub struct Audience(pub Vec<String>);

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct AudienceVisitor;

        impl<'de> de::Visitor<'de> for AudienceVisitor {
            type Value = Audience;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or array of strings")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Audience(vec![v.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(v) = seq.next_element::<String>()? {
                    values.push(v);
                }
                Ok(Audience(values))
            }
        }

        deserializer.deserialize_any(AudienceVisitor)
    }
}

/// Roles は JWT のロールクレームを表す。
/// 文字列または文字列配列のどちらも受け付ける。
#[derive(Debug, Clone, Default)]
pub struct Roles(pub Vec<String>);

impl<'de> Deserialize<'de> for Roles {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct RolesVisitor;

        impl<'de> de::Visitor<'de> for RolesVisitor {
            type Value = Roles;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or array of strings")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Roles(vec![v.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(v) = seq.next_element::<String>()? {
                    values.push(v);
                }
                Ok(Roles(values))
            }
        }

        deserializer.deserialize_any(RolesVisitor)
    }
}

impl Claims {
    /// 最初のオーディエンスを返す。
    pub fn audience(&self) -> Option<&str> {
        self.aud.0.first().map(|s| s.as_str())
    }

    /// ロール一覧を返す。
    pub fn roles(&self) -> &[String] {
        &self.roles.0
    }

    /// ロール一覧を正規化した集合として返す。
    pub fn role_set(&self) -> HashSet<String> {
        self.roles.0.iter().cloned().collect()
    }

    /// 指定ロールを保持しているかを返す。
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.0.iter().any(|r| r == role)
    }

    /// 監査・使用者記録に用いる主体識別子を返す。
    /// フォールバック順は sub → email → "unknown"。
    pub fn staff_id(&self) -> &str {
        if !self.sub.is_empty() {
            return &self.sub;
        }
        if let Some(ref email) = self.email {
            if !email.is_empty() {
                return email;
            }
        }
        "unknown"
    }
}

impl std::fmt::Display for Claims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Claims{{sub={}, iss={}, aud={:?}, roles={:?}, email={:?}}}",
            self.sub,
            self.iss,
            self.audience(),
            self.roles.0,
            self.email,
        )
    }
}
